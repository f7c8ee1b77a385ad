/// Characters scanned when sniffing the delimiter.
const SCAN_LIMIT: usize = 5000;

/// Candidates in tie-break order.
pub const CANDIDATES: [char; 3] = [',', ';', '\t'];

/// Picks the separator that occurs most often outside quotes on the first line.
///
/// Only the first `SCAN_LIMIT` characters are examined and counting stops at
/// the first unquoted newline. A doubled quote is a literal and never toggles
/// the quoted state. Ties go to the earlier candidate, so text without any
/// separator yields `,`.
pub fn detect_delimiter(text: &str) -> char {
    let chars: Vec<char> = text.chars().take(SCAN_LIMIT).collect();
    let mut counts = [0usize; CANDIDATES.len()];
    let mut in_quotes = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if chars.get(i + 1) == Some(&'"') {
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if !in_quotes {
            if let Some(slot) = CANDIDATES.iter().position(|c| *c == ch) {
                counts[slot] += 1;
            }
            if ch == '\n' {
                break;
            }
        }
        i += 1;
    }

    let mut best = CANDIDATES[0];
    let mut best_count: Option<usize> = None;
    for (candidate, count) in CANDIDATES.iter().zip(counts) {
        if best_count.map_or(true, |current| count > current) {
            best_count = Some(count);
            best = *candidate;
        }
    }
    best
}
