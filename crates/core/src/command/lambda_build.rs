use crate::properties::Architecture;

/// Arguments for `cargo lambda build` of a single binary
#[derive(Debug, Clone, Default)]
pub struct LambdaBuildArgs<'a> {
    pub bin: &'a str,
    pub release: bool,
    pub architecture: Architecture,
    pub features: &'a [String],
}

impl LambdaBuildArgs<'_> {
    /// Arguments passed after the cargo program.
    ///
    /// Default features are always disabled; the binary's `required-features`
    /// are passed explicitly, in manifest order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "lambda".to_string(),
            "build".to_string(),
            "--bin".to_string(),
            self.bin.to_string(),
        ];

        if self.release {
            args.push("--release".to_string());
        }

        if self.architecture.is_arm64() {
            args.push("--arm64".to_string());
        }

        args.push("--no-default-features".to_string());

        if !self.features.is_empty() {
            args.push("--features".to_string());
            args.push(self.features.join(","));
        }

        args
    }
}
