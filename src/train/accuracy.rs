use crate::data::data_point::DataPoint;

/// Fraction of points whose argmax output equals their label.
///
/// Points without a label (or without an output yet) count as misses; an
/// empty slice scores 0.
pub fn accuracy(points: &[DataPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let correct = points.iter()
        .filter(|p| p.label.is_some() && p.output.argmax() == p.label)
        .count();
    correct as f64 / points.len() as f64
}
