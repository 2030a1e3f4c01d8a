/// One pre-chunked excerpt of an institutional policy document.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub policy_name: String,
    pub chunk: String,
}

impl PolicyChunk {
    /// Builds a chunk from a file named like `ch1-academic_credit_policy-len477.txt`.
    pub fn from_file(file_name: &str, text: String, index: usize) -> Self {
        let stem = file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name);

        // Without a `-` the whole stem serves as both chunk label and name.
        let (chunk, name) = match stem.split_once('-') {
            Some((chunk, rest)) => (
                chunk,
                rest.rsplit_once("-len").map(|(name, _)| name).unwrap_or(rest),
            ),
            None => (stem, stem),
        };

        Self {
            id: format!("{}_{}", stem, index),
            text,
            source: file_name.to_string(),
            policy_name: name.replace('_', " "),
            chunk: chunk.to_string(),
        }
    }
}
