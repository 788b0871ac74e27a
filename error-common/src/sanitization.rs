// Sanitization utilities
// This module provides data sanitization for security

pub struct DataSanitizer {
    // Implementation for data sanitization
}

impl DataSanitizer {
    pub fn new() -> Self {
        Self {}
    }
    
    pub fn sanitize_for_logging(&self, data: &str) -> String {
        // Basic sanitization - remove potential sensitive data
        data.to_string()
    }
}