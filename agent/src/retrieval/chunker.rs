//! Line-aware text chunking with overlap

/// Splits text into chunks of at most `size` bytes, preferring line breaks
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Overlap is clamped below the chunk size
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size - 1),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        for piece in text
            .split_inclusive('\n')
            .flat_map(|line| split_long(line, self.size))
        {
            if current_len + piece.len() > self.size && !current.is_empty() {
                chunks.push(current.concat());

                // Carry whole trailing pieces that fit in the overlap
                let mut start = current.len();
                let mut kept = 0;
                while start > 0 && kept + current[start - 1].len() <= self.overlap {
                    start -= 1;
                    kept += current[start].len();
                }
                current.drain(..start);
                current_len = kept;

                while current_len + piece.len() > self.size && !current.is_empty() {
                    current_len -= current.remove(0).len();
                }
            }
            current.push(piece);
            current_len += piece.len();
        }

        if !current.is_empty() {
            chunks.push(current.concat());
        }
        chunks.retain(|chunk| !chunk.trim().is_empty());
        chunks
    }
}

/// Hard-split a line longer than `size` on char boundaries
fn split_long(line: &str, size: usize) -> Vec<&str> {
    if line.len() <= size {
        return vec![line];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    while start < line.len() {
        let mut end = (start + size).min(line.len());
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            end = start + line[start..].chars().next().map_or(1, char::len_utf8);
        }
        pieces.push(&line[start..end]);
        start = end;
    }
    pieces
}
