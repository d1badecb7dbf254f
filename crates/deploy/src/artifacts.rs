//! Hardhat compilation artifacts and ABI encoding of human-readable arguments.
//!
//! Arguments are kept as strings (`"8"`, `"0x01BE..."`, `"ipfs://..."`) all the way to
//! encoding time, where the ABI of the artifact decides how each one is parsed.

use std::path::{Path, PathBuf};

use alloy_core::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_core::json_abi::{JsonAbi, Param};
use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// A compiled contract as written by `hardhat compile`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// Debug file next to each artifact, pointing at its build info.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// Compiler input and version shared by all contracts compiled together.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Standard JSON input given to solc.
    pub input: Value,
}

impl Artifact {
    /// `contracts/Foo.sol:Foo`, the form block explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// ABI-encode constructor arguments, without the bytecode.
    pub fn encode_constructor_args(&self, args: &[String]) -> Result<Bytes> {
        match self.abi.constructor() {
            Some(constructor) => encode_params(&constructor.inputs, args)
                .with_context(|| format!("Invalid constructor arguments for {}", self.contract_name)),
            None if args.is_empty() => Ok(Bytes::new()),
            None => anyhow::bail!(
                "{} has no constructor but {} arguments were given",
                self.contract_name,
                args.len()
            ),
        }
    }

    /// Creation bytecode followed by the encoded constructor arguments.
    pub fn deploy_data(&self, args: &[String]) -> Result<Bytes> {
        if self.bytecode.is_empty() {
            anyhow::bail!(
                "{} has no bytecode (abstract contract or interface?)",
                self.contract_name
            );
        }

        let encoded = self.encode_constructor_args(args)?;
        let mut data = self.bytecode.to_vec();
        data.extend_from_slice(&encoded);
        Ok(data.into())
    }

    /// Encode a call to `function`, picking the overload matching the argument count.
    pub fn encode_function_call(&self, function: &str, args: &[String]) -> Result<Bytes> {
        let overloads = self
            .abi
            .function(function)
            .with_context(|| format!("{} has no function {}", self.contract_name, function))?;

        let func = overloads
            .iter()
            .find(|f| f.inputs.len() == args.len())
            .with_context(|| {
                format!(
                    "{}.{} has no overload taking {} arguments",
                    self.contract_name,
                    function,
                    args.len()
                )
            })?;

        let encoded = encode_params(&func.inputs, args)
            .with_context(|| format!("Invalid arguments for {}.{}", self.contract_name, function))?;

        let mut data = func.selector().to_vec();
        data.extend_from_slice(&encoded);
        Ok(data.into())
    }
}

fn encode_params(params: &[Param], args: &[String]) -> Result<Bytes> {
    if params.len() != args.len() {
        anyhow::bail!("expected {} arguments, got {}", params.len(), args.len());
    }

    let values = params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .with_context(|| format!("Unsupported parameter type {}", param.ty))?;
            ty.coerce_str(arg)
                .with_context(|| format!("Cannot parse {:?} as {} ({})", arg, ty, param.name))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params().into())
}

/// Lookup of artifacts under a Hardhat `artifacts/` directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Locate `<name>.json` anywhere below the root, skipping build info and debug files.
    pub fn find(&self, name: &str) -> Result<PathBuf> {
        let file_name = format!("{}.json", name);
        let mut pending = vec![self.root.clone()];
        let mut matches = Vec::new();

        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir)
                .with_context(|| format!("Failed to read artifacts directory {}", dir.display()))?;

            for entry in entries {
                let path = entry?.path();
                if path.is_dir() {
                    if path.file_name().is_some_and(|n| n != "build-info") {
                        pending.push(path);
                    }
                } else if path.file_name().is_some_and(|n| n == file_name.as_str()) {
                    matches.push(path);
                }
            }
        }

        match matches.len() {
            0 => anyhow::bail!(
                "No artifact for {} under {} (did you run `hardhat compile`?)",
                name,
                self.root.display()
            ),
            1 => Ok(matches.remove(0)),
            n => anyhow::bail!("{} artifacts named {} under {}", n, name, self.root.display()),
        }
    }

    pub fn load(&self, name: &str) -> Result<Artifact> {
        let path = self.find(name)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))
    }

    /// Load the build info referenced by `<name>.dbg.json`.
    pub fn build_info(&self, name: &str) -> Result<BuildInfo> {
        let artifact_path = self.find(name)?;
        let dbg_path = artifact_path.with_file_name(format!("{}.dbg.json", name));
        let content = std::fs::read_to_string(&dbg_path)
            .with_context(|| format!("Failed to read {}", dbg_path.display()))?;
        let dbg: DebugFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", dbg_path.display()))?;

        let dir = dbg_path
            .parent()
            .context("Debug file path must have a parent directory")?;
        let build_info_path = dir.join(dbg.build_info);
        let content = std::fs::read_to_string(&build_info_path)
            .with_context(|| format!("Failed to read {}", build_info_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse build info {}", build_info_path.display()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempdir::TempDir;

    /// Minimal artifact with a constructor mixing static and dynamic types.
    pub(crate) fn sample_artifact_json() -> Value {
        serde_json::json!({
            "contractName": "Sample",
            "sourceName": "contracts/Sample.sol",
            "abi": [
                {
                    "type": "constructor",
                    "stateMutability": "nonpayable",
                    "inputs": [
                        { "name": "name", "type": "string", "internalType": "string" },
                        { "name": "supply", "type": "uint256", "internalType": "uint256" },
                        { "name": "provider", "type": "address", "internalType": "address" }
                    ]
                },
                {
                    "type": "function",
                    "name": "initialize",
                    "stateMutability": "nonpayable",
                    "inputs": [
                        { "name": "supply", "type": "uint256", "internalType": "uint256" }
                    ],
                    "outputs": []
                }
            ],
            "bytecode": "0x6080604052",
            "deployedBytecode": "0x6080"
        })
    }

    pub(crate) fn write_artifacts(root: &Path) {
        let dir = root.join("contracts/Sample.sol");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("Sample.json"),
            serde_json::to_string(&sample_artifact_json()).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.join("Sample.dbg.json"),
            r#"{"_format":"hh-sol-dbg-1","buildInfo":"../../build-info/abc.json"}"#,
        )
        .unwrap();

        let build_info = root.join("build-info");
        std::fs::create_dir_all(&build_info).unwrap();
        std::fs::write(
            build_info.join("abc.json"),
            r#"{"solcVersion":"0.8.7","solcLongVersion":"0.8.7+commit.e28d00a7","input":{"language":"Solidity","sources":{}}}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_and_build_info() {
        let tmp = TempDir::new("revealkit-artifacts").unwrap();
        write_artifacts(tmp.path());
        let store = ArtifactStore::new(tmp.path());

        let artifact = store.load("Sample").unwrap();
        assert_eq!(artifact.fully_qualified_name(), "contracts/Sample.sol:Sample");

        let build_info = store.build_info("Sample").unwrap();
        assert_eq!(build_info.solc_long_version, "0.8.7+commit.e28d00a7");
        assert_eq!(build_info.input["language"], "Solidity");

        assert!(store.load("Missing").is_err());
    }

    #[test]
    fn test_constructor_encoding() {
        let artifact: Artifact = serde_json::from_value(sample_artifact_json()).unwrap();
        let args = vec![
            "RESTORE".to_string(),
            "8".to_string(),
            "0x0000000000000000000000000000000000000001".to_string(),
        ];

        let encoded = artifact.encode_constructor_args(&args).unwrap();
        // Head (3 words) + string length word + one padded data word.
        assert_eq!(encoded.len(), 5 * 32);
        assert_eq!(encoded[63], 8);

        let data = artifact.deploy_data(&args).unwrap();
        assert!(data.starts_with(&[0x60, 0x80, 0x60, 0x40, 0x52]));
        assert_eq!(data.len(), 5 + encoded.len());
    }

    #[test]
    fn test_constructor_argument_errors() {
        let artifact: Artifact = serde_json::from_value(sample_artifact_json()).unwrap();

        assert!(artifact.encode_constructor_args(&["only-one".to_string()]).is_err());
        assert!(artifact
            .encode_constructor_args(&[
                "RESTORE".to_string(),
                "not-a-number".to_string(),
                "0x0000000000000000000000000000000000000001".to_string(),
            ])
            .is_err());
    }

    #[test]
    fn test_function_call_encoding() {
        let artifact: Artifact = serde_json::from_value(sample_artifact_json()).unwrap();

        let data = artifact
            .encode_function_call("initialize", &["4".to_string()])
            .unwrap();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[35], 4);

        assert!(artifact.encode_function_call("initialize", &[]).is_err());
        assert!(artifact.encode_function_call("missing", &[]).is_err());
    }
}
