use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use pepforge::engine::progress::{Progress, ProgressCallback};

/// One residue-level progress bar shared by every file labeled in parallel.
///
/// Each structure adds its residue count to the bar's length when it starts,
/// so the total grows as rayon picks up more files.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: ProgressBar,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target)
            .with_style(Self::bar_style())
            .with_message("Labeling residues");
        Self { pb }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();

        Box::new(move |progress: Progress| match progress {
            Progress::LabelingStart { total_residues } => {
                pb.inc_length(total_residues);
            }
            Progress::ResidueStart { subst_id } => {
                pb.set_message(format!("Residue {}", subst_id));
            }
            Progress::ResidueFinish { subst_id, found } => {
                if !found {
                    pb.println(format!("  Backbone not found in residue {}", subst_id));
                }
                pb.inc(1);
            }
            Progress::LabelingFinish => {}
            Progress::Message(msg) => {
                pb.println(format!("  {}", msg));
            }
        })
    }

    pub fn finish(&self) {
        if let Some(length) = self.pb.length() {
            self.pb.set_position(length);
        }
        self.pb.finish_with_message("✓ Done");
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map(|style| {
                style
                    .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                        let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                    })
                    .progress_chars("##-")
            })
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hidden_handler() -> CliProgressHandler {
        CliProgressHandler::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn handler_starts_empty() {
        let handler = hidden_handler();
        assert_eq!(handler.pb.length(), Some(0));
        assert_eq!(handler.pb.position(), 0);
    }

    #[test]
    fn callback_tracks_residues() {
        let handler = hidden_handler();
        let callback = handler.get_callback();

        callback(Progress::LabelingStart { total_residues: 3 });
        callback(Progress::ResidueStart { subst_id: 1 });
        callback(Progress::ResidueFinish {
            subst_id: 1,
            found: true,
        });
        callback(Progress::ResidueFinish {
            subst_id: 2,
            found: false,
        });
        callback(Progress::Message("note".to_string()));

        assert_eq!(handler.pb.length(), Some(3));
        assert_eq!(handler.pb.position(), 2);

        handler.finish();
        assert!(handler.pb.is_finished());
        assert_eq!(handler.pb.position(), 3);
    }

    #[test]
    fn callbacks_from_several_threads_share_one_bar() {
        let handler = hidden_handler();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let callback = handler.get_callback();
                thread::spawn(move || {
                    callback(Progress::LabelingStart { total_residues: 2 });
                    for subst_id in 1..=2 {
                        callback(Progress::ResidueFinish {
                            subst_id,
                            found: true,
                        });
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(handler.pb.length(), Some(8));
        assert_eq!(handler.pb.position(), 8);
    }
}
