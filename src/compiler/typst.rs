use crate::tools::describe;
use folio_traits::{CompileRequest, CompilerError, DocumentCompiler};
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Drives the `typst` command-line compiler.
///
/// Every unit is produced from the same renderer source; the unit is chosen
/// with `--input target=<id>`.
#[derive(Debug, Clone)]
pub struct TypstCompiler {
    program: PathBuf,
    root: PathBuf,
    renderer: PathBuf,
}

impl TypstCompiler {
    /// `renderer` is resolved against `root`.
    pub fn new(program: impl Into<PathBuf>, root: impl Into<PathBuf>, renderer: impl AsRef<Path>) -> Self {
        let root = root.into();
        let renderer = root.join(renderer);
        Self { program: program.into(), root, renderer }
    }

    /// Arguments of a `compile` invocation, without the program name.
    pub fn compile_args(&self, request: &CompileRequest<'_>) -> Result<Vec<OsString>, CompilerError> {
        let mut args: Vec<OsString> = vec![
            "compile".into(),
            self.renderer.clone().into(),
            request.output.into(),
            "--input".into(),
            format!("target={}", request.target).into(),
        ];
        if let Some(offset) = request.page_offset {
            args.push("--input".into());
            args.push(format!("page-offset={offset}").into());
        }
        if let Some(map) = request.page_map {
            let json = map.to_json().map_err(|e| CompilerError::Input(e.to_string()))?;
            args.push("--input".into());
            args.push(format!("page-map={json}").into());
        }
        Ok(args)
    }

    fn run(&self, args: &[OsString]) -> Result<Vec<u8>, CompilerError> {
        debug!("Running {}", describe(&self.program, args));
        let output = Command::new(&self.program).args(args).output().map_err(|source| {
            CompilerError::Spawn { program: self.program.display().to_string(), source }
        })?;
        if !output.status.success() {
            return Err(CompilerError::Failed {
                command: describe(&self.program, args),
                status: output.status.to_string(),
                diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }
}

impl DocumentCompiler for TypstCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<(), CompilerError> {
        let args = self.compile_args(request)?;
        self.run(&args).map(|_| ())
    }

    fn query(&self, source: &Path, selector: &str) -> Result<String, CompilerError> {
        let args: Vec<OsString> = vec!["query".into(), source.into(), selector.into()];
        let stdout = self.run(&args)?;
        String::from_utf8(stdout).map_err(|e| CompilerError::InvalidOutput(e.to_string()))
    }

    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    fn name(&self) -> &str {
        "typst"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{PageMapBuilder, UnitId};

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn discovery_args_carry_only_the_target() {
        let compiler = TypstCompiler::new("typst", "proj", "renderer.typ");
        let target = UnitId::cover();
        let output = Path::new("build/00_cover.pdf");
        let args = strings(compiler.compile_args(&CompileRequest::discovery(&target, output)).unwrap());

        assert_eq!(
            args,
            vec!["compile", "proj/renderer.typ", "build/00_cover.pdf", "--input", "target=cover"]
        );
    }

    #[test]
    fn resolution_args_add_offset_and_map() {
        let compiler = TypstCompiler::new("typst", "proj", "renderer.typ");
        let mut builder = PageMapBuilder::new();
        builder.record(UnitId::cover(), 1).unwrap();
        builder.record(UnitId::outline(), 2).unwrap();
        let map = builder.finalize();
        let target = UnitId::outline();
        let request = CompileRequest {
            target: &target,
            output: Path::new("o.pdf"),
            page_offset: Some(2),
            page_map: Some(&map),
        };

        let args = strings(compiler.compile_args(&request).unwrap());

        assert_eq!(&args[5..], ["--input", "page-offset=2", "--input", r#"page-map={"cover":1,"outline":2}"#]);
    }
}
