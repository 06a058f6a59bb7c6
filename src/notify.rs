// Desktop notification seam.
//
// The shell owns the actual desktop notification mechanism; the core only
// decides when a notification is due (terminal outcomes, and only when
// enabled in settings) and hands the text through this trait.

pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);
}

/// Default notifier that drops everything; used when the shell has not
/// plugged anything in.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _summary: &str, _body: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    pub struct RecordingNotifier {
        pub messages: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, summary: &str, body: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((summary.to_string(), body.to_string()));
        }
    }

    #[test]
    fn test_null_notifier_is_silent() {
        NullNotifier.notify("title", "body");
    }

    #[test]
    fn test_recording_notifier_captures() {
        let n = RecordingNotifier {
            messages: Mutex::new(Vec::new()),
        };
        n.notify("Download complete", "clip.mp4");
        let messages = n.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "Download complete");
    }
}
