/// Target chunk size in characters.
const CHUNK_SIZE: usize = 1024;
/// Overlap carried from the tail of one chunk into the head of the next.
const CHUNK_OVERLAP: usize = 20;

/// Split `text` into ~`CHUNK_SIZE`-character chunks along sentence
/// boundaries, each overlapping the previous by `CHUNK_OVERLAP` characters.
/// Sentences are split on `.`, `!`, `?` followed by whitespace, then
/// greedily packed without any NLP dependency.
pub fn split_into_chunks(text: &str) -> Vec<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        if !current.is_empty() && current.chars().count() + sentence.chars().count() > CHUNK_SIZE {
            chunks.push(current.trim().to_string());
            let overlap = tail_chars(&current, CHUNK_OVERLAP);
            current = overlap;
        }
        if !current.is_empty() && !current.ends_with(' ') {
            current.push(' ');
        }
        current.push_str(&sentence);
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let is_boundary = matches!(c, '.' | '!' | '?');
        let next_is_whitespace_or_end = chars.get(i + 1).map(|n| n.is_whitespace()).unwrap_or(true);
        if is_boundary && next_is_whitespace_or_end {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

fn tail_chars(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= n {
        s.to_string()
    } else {
        chars[chars.len() - n..].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_yields_one_chunk() {
        let chunks = split_into_chunks("Hello there. How are you?");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn long_text_yields_multiple_chunks() {
        let sentence = "This is a sentence about veribot and its retrieval augmented generation engine. ";
        let text = sentence.repeat(60);
        let chunks = split_into_chunks(&text);
        assert!(chunks.len() >= 3, "expected at least 3 chunks, got {}", chunks.len());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= CHUNK_SIZE + sentence.chars().count());
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_into_chunks("").is_empty());
        assert!(split_into_chunks("   ").is_empty());
    }
}
