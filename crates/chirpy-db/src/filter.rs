pub const BANNED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
pub const MASK: &str = "****";

/// Replace every whitespace-delimited word that case-insensitively equals a
/// banned word with `MASK`. Words with attached punctuation are left alone,
/// and the original whitespace is kept as-is.
pub fn censor(body: &str) -> String {
    let mut out = String::with_capacity(body.len());

    for piece in body.split_inclusive(char::is_whitespace) {
        let word = piece.trim_end_matches(char::is_whitespace);
        if is_banned(word) {
            out.push_str(MASK);
            out.push_str(&piece[word.len()..]);
        } else {
            out.push_str(piece);
        }
    }

    out
}

fn is_banned(word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let lowered = word.to_lowercase();
    BANNED_WORDS.iter().any(|banned| lowered == *banned)
}
