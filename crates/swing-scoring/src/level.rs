/// Uniform 0/1/2/3 level contract, shared by fastpass and rolling (spec
/// §4.5). Frozen regardless of which rule id produced `score`.
pub fn level(score: f64, rows_total: u32, threshold: f64) -> i32 {
    if rows_total < 4 {
        if score >= threshold {
            1
        } else {
            0
        }
    } else if score >= threshold {
        3
    } else {
        2
    }
}
