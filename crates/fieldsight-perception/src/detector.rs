//! [`DetectorAdapter`] – object-detection pipelines.

use fieldsight_hal::{DetectorPipeline, PipelineSettings, VisionPipeline};
use fieldsight_types::{SourceFamily, SourceId};

use crate::candidate::ObjectObservation;

/// Turns raw detector angles into an [`ObjectObservation`].
///
/// Vendor pipelines report the horizontal offset positive to the right;
/// observations are counter-clockwise positive, so the sign is flipped here.
pub struct DetectorAdapter {
    source: SourceId,
    pipeline: Box<dyn DetectorPipeline>,
}

impl DetectorAdapter {
    pub fn new(mut pipeline: Box<dyn DetectorPipeline>, settings: &PipelineSettings) -> Self {
        pipeline.configure(settings);
        Self {
            source: SourceId::new(SourceFamily::ObjectDetection, pipeline.id()),
            pipeline,
        }
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Latest observation, or `None` when the pipeline has published nothing
    /// fresh.
    pub fn poll(&mut self) -> Option<ObjectObservation> {
        let reading = self.pipeline.latest_detection()?;
        Some(ObjectObservation {
            horizontal_offset_deg: -reading.tx_deg,
            vertical_offset_deg: reading.ty_deg,
            visible: reading.has_target,
        })
    }
}
