use indicatif::{ProgressBar, ProgressStyle};
use kilnflow_core::BuildRecord;

/// ビルドログの表示
///
/// ステップ出力はそのまま流し、pull等のステータスはスピナーに反映する。
pub struct BuildProgress {
    progress_bar: ProgressBar,
}

impl BuildProgress {
    pub fn new(image_tag: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.set_message(format!("Building {}...", image_tag));

        Self { progress_bar: pb }
    }

    /// レコードを表示へ反映する
    pub fn handle_record(&self, record: &BuildRecord) {
        if let Some(text) = &record.stream {
            let text = text.trim_end();
            if !text.is_empty() {
                self.progress_bar.println(text);
            }
        }

        if let Some(status) = &record.status {
            match &record.progress {
                Some(progress) => self
                    .progress_bar
                    .set_message(format!("{} {}", status, progress)),
                None => self.progress_bar.set_message(status.clone()),
            }
        }
    }

    pub fn finish_success(&self) {
        self.progress_bar.finish_with_message("Build completed ✓");
    }

    pub fn finish_error(&self, error: &str) {
        self.progress_bar
            .finish_with_message(format!("Build failed: {}", error));
    }
}
