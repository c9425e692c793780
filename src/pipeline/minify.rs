//! Script and stylesheet minification.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Both return `None` on
//! sources they cannot parse; callers then serve the original untouched.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Minify JavaScript source code.
///
/// Parsed as a classic script: top-level names share the page's global
/// scope and are left alone.
pub fn minify_js(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify a static asset by its extension.
///
/// Returns `Some(minified)` for `.js` and `.css` sources that parse,
/// `None` otherwise.
pub fn minify_asset(ext: &str, content: &str) -> Option<String> {
    match ext {
        "js" | "mjs" => minify_js(content),
        "css" => minify_css(content),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_css() {
        let css = "body {\n    color: red;\n    margin: 0px;\n}\n";
        let out = minify_css(css).unwrap();
        assert!(out.len() < css.len());
        assert!(!out.contains('\n'));
        assert!(out.contains("color:red"));
    }

    #[test]
    fn test_minify_js() {
        let js = "function greet(name) {\n  // say hi\n  return 'hi ' + name;\n}\n";
        let out = minify_js(js).unwrap();
        assert!(out.len() < js.len());
        assert!(!out.contains("say hi"));
        assert!(out.contains("greet"));
    }

    #[test]
    fn test_invalid_js_is_none() {
        assert!(minify_js("function (").is_none());
    }

    #[test]
    fn test_minify_asset_by_ext() {
        assert!(minify_asset("css", "a { color: red; }").is_some());
        assert!(minify_asset("txt", "plain").is_none());
    }
}
