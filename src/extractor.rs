use serde_json::Value;

/// Collects every non-empty string stored under one key, at any depth
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    target_key: String,
}

impl KeyExtractor {
    pub fn new(target_key: impl Into<String>) -> Self {
        KeyExtractor {
            target_key: target_key.into(),
        }
    }

    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Extract from a slice of records into a fresh vector, preserving record order
    pub fn extract_all(&self, records: &[Value]) -> Vec<String> {
        let mut out = Vec::new();
        for record in records {
            self.extract(record, &mut out);
        }
        out
    }

    /// Depth-first walk of `value`, appending matches to `out`.
    ///
    /// Uses an explicit stack of iterators, so nesting depth is bounded by
    /// memory rather than the thread stack. Unexpected shapes are skipped;
    /// this never fails.
    pub fn extract(&self, value: &Value, out: &mut Vec<String>) {
        let mut stack: Vec<Frame<'_>> = Vec::new();
        self.visit(value, &mut stack);

        while let Some(frame) = stack.last_mut() {
            let next = match frame {
                Frame::Array(items) => items.next(),
                Frame::Object(entries) => loop {
                    match entries.next() {
                        Some((key, value)) if *key == self.target_key => {
                            // A matched key is never descended into, even when
                            // its value is a nested structure.
                            if let Value::String(s) = value {
                                if !s.is_empty() {
                                    out.push(s.clone());
                                }
                            }
                        }
                        Some((_, value)) => break Some(value),
                        None => break None,
                    }
                },
            };

            match next {
                Some(child) => self.visit(child, &mut stack),
                None => {
                    stack.pop();
                }
            }
        }
    }

    fn visit<'a>(&self, value: &'a Value, stack: &mut Vec<Frame<'a>>) {
        match value {
            Value::Object(obj) => stack.push(Frame::Object(obj.iter())),
            Value::Array(arr) => stack.push(Frame::Array(arr.iter())),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

/// A partially visited container
enum Frame<'a> {
    Array(std::slice::Iter<'a, Value>),
    Object(serde_json::map::Iter<'a>),
}
