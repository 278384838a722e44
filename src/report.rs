use crate::classifier::ScoreVector;
use std::io::Write;

/// Write the scores as one space-separated line.
pub fn write_scores<W: Write>(writer: &mut W, scores: &ScoreVector) -> std::io::Result<()> {
    writeln!(writer, "{}", scores)
}
