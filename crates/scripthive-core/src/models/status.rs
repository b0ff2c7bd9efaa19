/// Coarse classification of the free-form status strings the backend uses
/// for projects and payment transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Pending,
    Failed,
    Other,
}

impl StatusKind {
    pub fn classify(status: Option<&str>) -> Self {
        match status.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("success") => StatusKind::Success,
            Some("pending") => StatusKind::Pending,
            Some("failed") => StatusKind::Failed,
            _ => StatusKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(StatusKind::classify(Some("Success")), StatusKind::Success);
        assert_eq!(StatusKind::classify(Some("PENDING")), StatusKind::Pending);
        assert_eq!(StatusKind::classify(Some(" failed ")), StatusKind::Failed);
        assert_eq!(StatusKind::classify(Some("cancelled")), StatusKind::Other);
        assert_eq!(StatusKind::classify(None), StatusKind::Other);
    }
}
