//! Rendering diagnostics for terminals, logs and HTML reports.

use super::{Diagnostic, Severity};
use crate::error::Result;
use crate::source::SourceFile;
use colored::{ColoredString, Colorize};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Plain,
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "terminal" => Ok(OutputFormat::Terminal),
            "plain" => Ok(OutputFormat::Plain),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!("unknown diagnostic format `{}` (expected terminal, plain or html)", other)),
        }
    }
}

/// Renders diagnostics against the source they were reported for.
#[derive(Debug, Clone)]
pub struct DiagnosticRenderer {
    /// Lines of context shown above and below the reported line in terminal output.
    pub context_lines: usize,
    /// Emit ANSI colors in terminal output.
    pub color: bool,
}

impl Default for DiagnosticRenderer {
    fn default() -> Self {
        DiagnosticRenderer::new(2)
    }
}

impl DiagnosticRenderer {
    pub fn new(context_lines: usize) -> Self {
        DiagnosticRenderer {
            context_lines,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn render(&self, diag: &Diagnostic, source: &SourceFile, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Terminal => self.render_terminal(diag, source),
            OutputFormat::Plain => self.render_plain(diag, source),
            OutputFormat::Html => self.render_html(diag, source),
        }
    }

    pub fn render_all<'a, I>(&self, diags: I, source: &SourceFile, format: OutputFormat) -> Result<String>
    where
        I: IntoIterator<Item = &'a Diagnostic>,
    {
        let rendered = diags
            .into_iter()
            .map(|d| self.render(d, source, format))
            .collect::<Result<Vec<String>>>()?;
        Ok(match format {
            OutputFormat::Html => format!("<div class=\"diagnostics\">\n{}</div>\n", rendered.concat()),
            _ => rendered.join("\n"),
        })
    }

    fn paint(&self, text: ColoredString) -> ColoredString {
        if self.color {
            text
        } else {
            text.clear()
        }
    }

    /// Framed window of `context_lines` around the error line, colored unless
    /// [`DiagnosticRenderer::color`] is off.
    pub fn render_terminal(&self, diag: &Diagnostic, source: &SourceFile) -> Result<String> {
        let mut out = String::new();
        let label = match diag.severity {
            Severity::Error => diag.severity.as_str().red().bold(),
            Severity::Warning => diag.severity.as_str().yellow().bold(),
            Severity::Info => diag.severity.as_str().blue().bold(),
            Severity::Hint => diag.severity.as_str().cyan().bold(),
        };
        let bar = self.paint("|".blue().bold());
        writeln!(
            out,
            "{}{}: {}",
            self.paint(label),
            self.paint(format!("[{}]", diag.code).bold()),
            self.paint(diag.message.as_str().bold())
        )?;

        if let Some(span) = diag.location {
            let first = (span.line as usize).saturating_sub(self.context_lines).max(1);
            let last = (span.line as usize + self.context_lines).min(source.line_count());
            let width = last.to_string().len();
            writeln!(
                out,
                "{}{} {}:{}:{}",
                " ".repeat(width),
                self.paint("-->".blue().bold()),
                source.name(),
                span.line,
                span.column
            )?;
            writeln!(out, "{} {}", " ".repeat(width), bar)?;
            for line_no in first..=last {
                let text = source.line(line_no as u32).unwrap_or("");
                writeln!(
                    out,
                    "{} {} {}",
                    self.paint(format!("{:>width$}", line_no, width = width).blue().bold()),
                    bar,
                    text
                )?;
                if line_no == span.line as usize {
                    let (pad, carets) = underline(text, span.column, span.len);
                    let carets = match diag.severity {
                        Severity::Error => carets.red().bold(),
                        Severity::Warning => carets.yellow().bold(),
                        _ => carets.cyan().bold(),
                    };
                    writeln!(out, "{} {} {}{}", " ".repeat(width), bar, pad, self.paint(carets))?;
                }
            }
            writeln!(out, "{} {}", " ".repeat(width), bar)?;
        }

        let equals = self.paint("=".blue().bold());
        for line in footer_lines(diag) {
            writeln!(out, "  {} {}", equals, line)?;
        }
        Ok(out)
    }

    /// Uncolored form showing only the reported line.
    pub fn render_plain(&self, diag: &Diagnostic, source: &SourceFile) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "{}[{}]: {}", diag.severity, diag.code, diag.message)?;
        if let Some(span) = diag.location {
            let width = span.line.to_string().len();
            let text = source.line(span.line).unwrap_or("");
            let (pad, carets) = underline(text, span.column, span.len);
            writeln!(out, "{}--> {}:{}:{}", " ".repeat(width), source.name(), span.line, span.column)?;
            writeln!(out, "{} | {}", span.line, text)?;
            writeln!(out, "{} | {}{}", " ".repeat(width), pad, carets)?;
        }
        for line in footer_lines(diag) {
            writeln!(out, "  = {}", line)?;
        }
        Ok(out)
    }

    /// HTML fragment with every user-controlled string escaped.
    pub fn render_html(&self, diag: &Diagnostic, source: &SourceFile) -> Result<String> {
        let mut out = String::new();
        writeln!(
            out,
            "<div class=\"diagnostic {}\" data-code=\"{}\">",
            diag.severity, diag.code
        )?;
        writeln!(
            out,
            "  <div class=\"diagnostic-header\"><span class=\"severity\">{}</span> <span class=\"code\">[{}]</span>: <span class=\"message\">{}</span></div>",
            diag.severity,
            diag.code,
            escape_html(&diag.message)
        )?;
        if let Some(span) = diag.location {
            let text = source.line(span.line).unwrap_or("");
            let (pad, carets) = underline(text, span.column, span.len);
            writeln!(
                out,
                "  <div class=\"diagnostic-location\">{}:{}:{}</div>",
                escape_html(source.name()),
                span.line,
                span.column
            )?;
            writeln!(
                out,
                "  <pre class=\"diagnostic-context\">{} | {}\n{} | {}{}</pre>",
                span.line,
                escape_html(text),
                " ".repeat(span.line.to_string().len()),
                pad,
                carets
            )?;
        }
        let footer = footer_lines(diag);
        if !footer.is_empty() {
            writeln!(out, "  <ul class=\"diagnostic-notes\">")?;
            for line in footer {
                writeln!(out, "    <li>{}</li>", escape_html(&line))?;
            }
            writeln!(out, "  </ul>")?;
        }
        writeln!(out, "</div>")?;
        Ok(out)
    }
}

/// Padding and caret run underlining `len` bytes starting at `column`.
/// A zero length underlines the rest of the line.
fn underline(line: &str, column: u32, len: usize) -> (String, String) {
    let start = (column.max(1) - 1) as usize;
    let line_chars = line.chars().count();
    let start = start.min(line_chars);
    let pad: String = line.chars().take(start).map(|c| if c == '\t' { '\t' } else { ' ' }).collect();
    let rest: String = line.chars().skip(start).collect();
    let available = rest.chars().count();
    let width = if len == 0 {
        available
    } else {
        let mut bytes = 0;
        rest.chars()
            .take_while(|c| {
                let fits = bytes < len;
                bytes += c.len_utf8();
                fits
            })
            .count()
    };
    (pad, "^".repeat(width.max(1)))
}

fn footer_lines(diag: &Diagnostic) -> Vec<String> {
    let mut lines = Vec::new();
    match diag.suggestions.as_slice() {
        [] => {}
        [only] => lines.push(format!("help: did you mean `{}`?", only)),
        many => {
            let quoted: Vec<String> = many.iter().map(|s| format!("`{}`", s)).collect();
            lines.push(format!("help: did you mean one of {}?", quoted.join(", ")));
        }
    }
    for related in &diag.related_information {
        match related.location {
            Some(span) => lines.push(format!("note: {} ({}:{})", related.message, span.line, span.column)),
            None => lines.push(format!("note: {}", related.message)),
        }
    }
    if let Some(url) = &diag.doc_url {
        lines.push(format!("note: see {}", url));
    }
    lines
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::diagnostics::DiagnosticCode;

    fn sample() -> (SourceFile, Diagnostic) {
        let source = SourceFile::new(
            "shader.glint",
            "fn main() {\n    let a = 1.0;\n    let b = positon;\n    return;\n}\n",
        );
        let diag = Diagnostic::new(DiagnosticCode::UndefinedVariable, "undefined variable `positon`")
            .at(Span::new(3, 13, 41, 7))
            .with_suggestion("position");
        (source, diag)
    }

    #[test]
    fn test_plain_has_single_context_line() {
        let (source, diag) = sample();
        let out = DiagnosticRenderer::default().render_plain(&diag, &source).unwrap();
        assert!(out.starts_with("error[GL3001]: undefined variable `positon`"));
        assert!(out.contains("--> shader.glint:3:13"));
        assert!(out.contains("3 |     let b = positon;"));
        assert!(out.contains("            ^^^^^^^"));
        assert!(!out.contains("let a"));
        assert!(out.contains("help: did you mean `position`?"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_terminal_shows_context_window() {
        let (source, diag) = sample();
        let out = DiagnosticRenderer::new(1)
            .with_color(false)
            .render_terminal(&diag, &source)
            .unwrap();
        assert!(out.contains("2 |     let a = 1.0;"));
        assert!(out.contains("3 |     let b = positon;"));
        assert!(out.contains("4 |     return;"));
        assert!(!out.contains("fn main"));
        assert!(out.contains("^^^^^^^"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_render_all_joins_in_order() {
        let (source, diag) = sample();
        let hint = Diagnostic::new(DiagnosticCode::UnusedFunction, "function `f` is never called");
        let out = DiagnosticRenderer::default()
            .with_color(false)
            .render_all([&diag, &hint], &source, OutputFormat::Terminal)
            .unwrap();
        let first = out.find("GL3001").unwrap();
        let second = out.find("never called").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_underline_defaults_to_rest_of_line() {
        let (pad, carets) = underline("    foo(bar);", 5, 0);
        assert_eq!(pad, "    ");
        assert_eq!(carets, "^^^^^^^^^");
    }

    #[test]
    fn test_html_escapes_message_and_context() {
        let source = SourceFile::new("a<b>.glint", "let x = a < b && c;\n");
        let diag = Diagnostic::new(DiagnosticCode::TypeMismatch, "expected `vec2<f32>` & got \"bool\"")
            .at(Span::new(1, 9, 8, 5));
        let out = DiagnosticRenderer::default().render_html(&diag, &source).unwrap();
        assert!(out.contains("expected `vec2&lt;f32&gt;` &amp; got &quot;bool&quot;"));
        assert!(out.contains("let x = a &lt; b &amp;&amp; c;"));
        assert!(out.contains("a&lt;b&gt;.glint:1:9"));
        assert!(out.contains("class=\"diagnostic error\""));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("html".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert!("json".parse::<OutputFormat>().is_err());
    }
}
