use crate::evaluation::domain::ground_truth::AnnotatedSample;

/// Supplies frames together with their ground truth.
pub trait AnnotationSource: Send {
    /// Total number of samples, including any that fail to load.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The next sample, `None` once all samples were returned. A failed
    /// sample does not end the sequence.
    fn next_sample(&mut self) -> Option<Result<AnnotatedSample, Box<dyn std::error::Error>>>;
}
