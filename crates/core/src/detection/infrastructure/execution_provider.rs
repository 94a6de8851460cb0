use ort::execution_providers::ExecutionProviderDispatch;

/// ONNX Runtime execution providers to register for the detector session.
///
/// With `accelerate` off, or on platforms without a hardware provider, the
/// list is empty and the session runs on the default CPU provider.
pub fn execution_providers(accelerate: bool) -> Vec<ExecutionProviderDispatch> {
    if !accelerate {
        return Vec::new();
    }
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_only_registers_nothing() {
        assert!(execution_providers(false).is_empty());
    }
}
