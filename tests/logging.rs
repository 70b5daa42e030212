use std::sync::{Arc, Mutex};

use ldap_filter::eval::eval;
use ldap_filter::{parse, Properties};
use slog::{o, Drain, Logger};

/// Collects rendered records so tests can inspect what was logged
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_logger() -> (Logger, Capture) {
    let capture = Capture::default();
    let decorator = slog_term::PlainSyncDecorator::new(capture.clone());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    (Logger::root(drain, o!()), capture)
}

#[test]
fn test_evaluation_is_logged() {
    let (logger, capture) = capture_logger();
    let filter = parse("(&(cn=Babs *)(!(sn=*)))").unwrap();
    let props = Properties::new().with("cn", "Babs Jensen");

    assert!(eval(&logger, filter.expr(), &props));

    let out = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(out.contains("evaluate filter"), "{out}");
    assert!(out.contains("(&(cn=Babs *)(!(sn=*)))"), "{out}");
    assert!(out.contains("result: true"), "{out}");
}

#[test]
fn test_matches_logged() {
    let (logger, capture) = capture_logger();
    let filter = parse("(cn=x)").unwrap();

    assert!(!filter.matches_logged(&logger, &Properties::new()));

    let out = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(out.contains("result: false"), "{out}");
}
