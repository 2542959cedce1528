//! Template documents
//!
//! A document is read fully into memory and rendered top to bottom, one
//! line at a time. Output files are always created or truncated, never
//! appended to.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::context::{Context, ContextSchema};
use crate::error::{Result, TemplateError, TemplateErrorKind};
use crate::substitution::{BlockError, block_marker, render_line, scalar_tokens};

/// Maximum Levenshtein distance for "did you mean" hints
const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    name: String,
    source: String,
}

impl TemplateDocument {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::new(name, source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lines with their terminators
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.source.split_inclusive('\n')
    }

    /// Render line by line into `out`
    pub fn render_into<W: Write>(&self, ctx: &Context, out: &mut W) -> Result<()> {
        let mut offset = 0;
        for line in self.lines() {
            let rendered = render_line(line, ctx).map_err(|e| self.block_error(offset, e))?;
            out.write_all(rendered.as_bytes())?;
            offset += line.len();
        }
        Ok(())
    }

    pub fn render(&self, ctx: &Context) -> Result<String> {
        let mut out = Vec::with_capacity(self.source.len());
        self.render_into(ctx, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Render into `dest`, replacing any previous content
    pub fn render_to_file(&self, ctx: &Context, dest: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(dest)?);
        self.render_into(ctx, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the template unchanged into `dest`
    pub fn copy_to_file(&self, dest: &Path) -> Result<()> {
        std::fs::write(dest, &self.source)?;
        Ok(())
    }

    /// Report tokens and markers that can never resolve against `schema`
    ///
    /// Such tokens are not errors at render time, where they are kept
    /// verbatim or dropped.
    pub fn check(&self, schema: &ContextSchema) -> Vec<TemplateError> {
        let mut problems = Vec::new();
        let mut offset = 0;

        for line in self.lines() {
            for (start, token, parsed) in scalar_tokens(line) {
                if parsed.default.is_none() && schema.resolve(parsed.key).is_none() {
                    problems.push(self.unknown_key(schema, offset + start, token, parsed.key));
                }
            }

            if let Some((start, marker_text, marker)) = block_marker(line) {
                match marker {
                    Ok(marker) if schema.resolve(marker.key).is_none() => {
                        problems.push(self.unknown_key(
                            schema,
                            offset + start,
                            marker_text,
                            marker.key,
                        ));
                    }
                    Ok(_) => {}
                    Err(e) => problems.push(self.block_error(offset, e)),
                }
            }

            offset += line.len();
        }

        problems
    }

    fn unknown_key(
        &self,
        schema: &ContextSchema,
        offset: usize,
        token: &str,
        key: &str,
    ) -> TemplateError {
        let err = TemplateError::at_offset(
            TemplateErrorKind::UnknownKey,
            format!("`{}` is not a key of the {} context", key, schema.name),
            &self.name,
            &self.source,
            offset,
            token.len(),
        );

        let closest = schema
            .key_names()
            .map(|candidate| (strsim::levenshtein(&key.to_lowercase(), &candidate.to_lowercase()), candidate))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance);

        match closest {
            Some((_, candidate)) => err.with_suggestion(format!("Did you mean `{}`?", candidate)),
            None => err.with_suggestion(format!(
                "Available keys: {}",
                schema.key_names().collect::<Vec<_>>().join(", ")
            )),
        }
    }

    fn block_error(&self, line_offset: usize, e: BlockError) -> TemplateError {
        TemplateError::at_offset(
            TemplateErrorKind::InvalidBlock,
            e.message,
            &self.name,
            &self.source,
            line_offset + e.offset,
            e.len,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CHART_GROUP_SCHEMA, CHART_SCHEMA};
    use crate::error::EngineError;
    use tempfile::TempDir;

    fn group_ctx() -> Context {
        Context::new(&CHART_GROUP_SCHEMA)
            .with("namespace", "demo")
            .unwrap()
            .with("chartNames", vec!["a".to_string(), "b".to_string()])
            .unwrap()
    }

    #[test]
    fn test_render_document() {
        let doc = TemplateDocument::new(
            "kustomization.yaml",
            "namespace: $namespace$\nresources:\n  - base\n@chart_names|2@\n",
        );
        let out = doc.render(&group_ctx()).unwrap();
        assert_eq!(out, "namespace: demo\nresources:\n  - base\n  - a\n  - b\n");
    }

    #[test]
    fn test_last_line_without_newline() {
        let doc = TemplateDocument::new("t", "a: $namespace$");
        assert_eq!(doc.render(&group_ctx()).unwrap(), "a: demo");
    }

    #[test]
    fn test_render_to_file_truncates() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.yaml");
        std::fs::write(&dest, "stale content that is much longer than the output\n").unwrap();

        let doc = TemplateDocument::new("t", "ns: $namespace$\n");
        doc.render_to_file(&group_ctx(), &dest).unwrap();
        doc.render_to_file(&group_ctx(), &dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "ns: demo\n");
    }

    #[test]
    fn test_invalid_block_points_at_marker() {
        let doc = TemplateDocument::new("t", "a: 1\n  @chart_names|99999999999999999999999@\n");
        let err = doc.render(&group_ctx()).unwrap_err();
        match err {
            EngineError::Template(e) => {
                assert_eq!(e.kind(), TemplateErrorKind::InvalidBlock);
                assert_eq!(e.span.unwrap().offset(), 7);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_check_reports_unknown_keys() {
        let doc = TemplateDocument::new(
            "helmrelease.yaml",
            "name: $name$\nns: $namspace$\nx: $other%ok$\n@charts|2@\n",
        );
        let problems = doc.check(&CHART_SCHEMA);
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].kind(), TemplateErrorKind::UnknownKey);
        assert_eq!(
            problems[0].suggestion.as_deref(),
            Some("Did you mean `namespace`?")
        );
        assert!(problems[1].message.contains("charts"));
    }
}
