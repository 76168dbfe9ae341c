use crate::application::engine::Enrichment;
use crate::domain::allocation::AllocationRecord;
use crate::domain::reference::GroupKind;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureView<'a> {
    kind: GroupKind,
    seller_number: &'a str,
    group_id: i64,
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document<'a> {
    data: &'a [AllocationRecord],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resolution_failures: Vec<FailureView<'a>>,
}

/// Writes an [`Enrichment`] as a pretty-printed `{ "data": [...] }` document.
///
/// Unresolved references are listed under `resolutionFailures`, which is left
/// out entirely when every group resolved.
pub struct AllocationWriter<W: Write> {
    sink: W,
}

impl<W: Write> AllocationWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write_enrichment(&mut self, enrichment: &Enrichment) -> Result<()> {
        let document = Document {
            data: &enrichment.records,
            resolution_failures: enrichment
                .failures
                .iter()
                .map(|f| FailureView {
                    kind: f.reference.kind,
                    seller_number: &f.reference.seller_number,
                    group_id: f.reference.group_id,
                    error: f.cause.to_string(),
                })
                .collect(),
        };
        serde_json::to_writer_pretty(&mut self.sink, &document)?;
        self.sink.write_all(b"\n")?;
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
