use std::io;
use std::sync::{Arc, Mutex};

use bt_nodes::{BlackboardBoolCondition, NodeCategory, NodeRegistry};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn registration_events_are_logged() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("bt_nodes=debug"))
        .with_target(false)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut registry = NodeRegistry::new();
        registry.register_condition::<BlackboardBoolCondition>(Some("Check"));
        registry.register_condition::<BlackboardBoolCondition>(Some("Check"));
        assert_eq!(registry.names(NodeCategory::Condition), vec!["Check"]);
    });

    let text = capture.text();
    assert!(text.contains("DEBUG"), "{text}");
    assert!(text.contains("node registered"), "{text}");
    assert!(text.contains("WARN"), "{text}");
    assert!(text.contains("node registration replaced"), "{text}");
}
