use opentelemetry::{metrics::Counter, KeyValue};

pub mod outcome {
    pub const MATCHED: &str = "matched";
    pub const FALLBACK: &str = "fallback";
    pub const FAILED: &str = "failed";
    pub const COMPLETE: &str = "complete";
    pub const PARTIAL: &str = "partial";
}

#[derive(Debug)]
pub struct Metrics {
    pub uploads: Counter<u64>,
    pub upload_bytes: Counter<u64>,
    pub folder_renames: Counter<u64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Metrics {
        let meter = opentelemetry::global::meter("face-sorter-server");
        let uploads = meter
            .u64_counter("face_sorter.server.uploads")
            .with_description("number of uploaded photos by outcome")
            .build();
        let upload_bytes = meter
            .u64_counter("face_sorter.server.upload_bytes")
            .with_description("number of bytes received in uploaded photos")
            .build();
        let folder_renames = meter
            .u64_counter("face_sorter.server.folder_renames")
            .with_description("number of folder renames by outcome")
            .build();
        Metrics {
            uploads,
            upload_bytes,
            folder_renames,
        }
    }

    pub fn upload(&self, outcome: &'static str) {
        self.uploads.add(1, &[KeyValue::new("outcome", outcome)]);
    }

    pub fn rename(&self, outcome: &'static str) {
        self.folder_renames
            .add(1, &[KeyValue::new("outcome", outcome)]);
    }
}
