/// Destination routing key plus opaque payload
///
/// One of these lives in every ring slot. Slots are allocated once and
/// rewritten in place, so `set` reuses the existing buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelatedRequest {
    destination: String,
    payload: Vec<u8>,
}

impl CorrelatedRequest {
    pub fn new(destination: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            destination: destination.into(),
            payload: payload.into(),
        }
    }

    /// Overwrite both fields, keeping the allocations
    pub fn set(&mut self, destination: &str, payload: &[u8]) {
        self.destination.clear();
        self.destination.push_str(destination);
        self.payload.clear();
        self.payload.extend_from_slice(payload);
    }

    pub fn clear(&mut self) {
        self.destination.clear();
        self.payload.clear();
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Mutable access to the payload buffer, for encoding in place
    pub fn payload_mut(&mut self) -> &mut Vec<u8> {
        &mut self.payload
    }

    pub fn set_destination(&mut self, destination: &str) {
        self.destination.clear();
        self.destination.push_str(destination);
    }

    /// A request with no destination carries nothing to deliver
    pub fn is_empty(&self) -> bool {
        self.destination.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reuses_buffers() {
        let mut request = CorrelatedRequest::new("rk.long.destination.name", vec![0u8; 64]);
        let payload_capacity = request.payload.capacity();

        request.set("rk.short", b"abc");

        assert_eq!(request.destination(), "rk.short");
        assert_eq!(request.payload(), b"abc");
        assert!(request.payload.capacity() >= payload_capacity);
    }

    #[test]
    fn test_clear_makes_request_empty() {
        let mut request = CorrelatedRequest::new("rk", b"x".to_vec());
        assert!(!request.is_empty());

        request.clear();
        assert!(request.is_empty());
        assert!(request.payload().is_empty());
    }
}
