/// A file picked by the operator, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FileAttachment),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File(_) => None,
        }
    }
}

/// Ordered `multipart/form-data` body. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<(String, FormValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts
            .push((name.into(), FormValue::Text(value.into())));
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: FileAttachment) {
        self.parts.push((name.into(), FormValue::File(file)));
    }

    pub fn parts(&self) -> &[(String, FormValue)] {
        &self.parts
    }

    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// First text value under `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_text())
    }

    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, v)| v.as_text())
            .collect()
    }

    pub fn file(&self, name: &str) -> Option<&FileAttachment> {
        self.parts.iter().find_map(|(n, v)| match v {
            FormValue::File(f) if n == name => Some(f),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_names_keep_order() {
        let mut form = MultipartForm::new();
        form.push_text("reviewers", "a");
        form.push_file("logo", FileAttachment::new("l.png", "image/png", vec![1, 2]));
        form.push_text("reviewers", "b");
        assert_eq!(form.texts("reviewers"), vec!["a", "b"]);
        assert_eq!(form.text("reviewers"), Some("a"));
        assert_eq!(form.text("logo"), None);
        assert_eq!(form.file("logo").map(|f| f.bytes.len()), Some(2));
        assert_eq!(form.names(), vec!["reviewers", "logo", "reviewers"]);
    }
}
