/// Format a computed number as its canonical decimal text.
///
/// Uses the shortest representation that round-trips, never exponent notation,
/// so the output is always accepted again as a numeric operand.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Covers -0.0 as well.
        "0".to_string()
    } else {
        n.to_string()
    }
}
