//! Import reference to repository file resolution.

use std::collections::{BTreeMap, HashMap};

use crate::knowledge::models::SourceFile;
use crate::knowledge::parser::ImportConvention;

/// Resolves import text to files using each language's path convention.
pub struct ImportResolver<'f> {
    by_path: HashMap<&'f str, &'f SourceFile>,
    /// File stem to files, for the last-resort unique match.
    by_stem: HashMap<&'f str, Vec<&'f SourceFile>>,
    /// Directory to files, sorted by path.
    by_dir: BTreeMap<&'f str, Vec<&'f SourceFile>>,
}

impl<'f> ImportResolver<'f> {
    pub fn new(files: &'f [SourceFile]) -> Self {
        let mut resolver = Self {
            by_path: HashMap::with_capacity(files.len()),
            by_stem: HashMap::new(),
            by_dir: BTreeMap::new(),
        };
        for file in files {
            resolver.by_path.insert(file.relative_path.as_str(), file);
            resolver.by_stem.entry(file_stem(file.file_name())).or_default().push(file);
            resolver.by_dir.entry(file.directory()).or_default().push(file);
        }
        for list in resolver.by_dir.values_mut() {
            list.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        }
        resolver
    }

    /// File imported by `raw` from `importer`, if any.
    pub fn resolve(&self, importer: &SourceFile, raw: &str, member: Option<&str>) -> Option<&'f SourceFile> {
        let convention = importer.language?.spec().imports;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let found = match convention {
            ImportConvention::Relative {
                extensions,
                index_files,
                bare_is_external,
            } => {
                let explicit = raw.starts_with('.') || raw.starts_with('/');
                if bare_is_external && !explicit {
                    return None;
                }
                self.relative(importer, raw, extensions, index_files)
            }
            ImportConvention::Dotted => self.dotted(importer, raw, member),
            ImportConvention::PackagePath {
                extensions,
                snake_case,
            } => self.package_path(raw, extensions, snake_case),
            ImportConvention::ModulePath => self.module_path(importer, raw),
            ImportConvention::Directory => self.directory(raw),
            ImportConvention::Feature { extensions } => self.feature(importer, raw, extensions),
        };

        found
            .filter(|file| file.id != importer.id)
            .or_else(|| self.unique_stem(importer, raw, convention))
    }

    fn lookup(&self, path: &str) -> Option<&'f SourceFile> {
        self.by_path.get(path).copied()
    }

    /// First existing path among `base`, `base.<ext>` and `base/index.<ext>`.
    fn with_extensions(&self, base: &str, extensions: &[&str], index_files: bool) -> Option<&'f SourceFile> {
        if let Some(file) = self.lookup(base) {
            return Some(file);
        }
        for ext in extensions {
            if let Some(file) = self.lookup(&format!("{base}.{ext}")) {
                return Some(file);
            }
        }
        if index_files {
            for ext in extensions {
                if let Some(file) = self.lookup(&join(base, &format!("index.{ext}"))) {
                    return Some(file);
                }
            }
        }
        None
    }

    /// First file whose path is `suffix.<ext>` or ends with `/suffix.<ext>`.
    fn by_suffix(&self, suffix: &str, extensions: &[&str]) -> Option<&'f SourceFile> {
        let mut matches: Vec<&'f SourceFile> = Vec::new();
        for ext in extensions {
            let wanted = format!("{suffix}.{ext}");
            let nested = format!("/{wanted}");
            matches.extend(
                self.by_path
                    .iter()
                    .filter(|(path, _)| **path == wanted || path.ends_with(&nested))
                    .map(|(_, file)| *file),
            );
            if !matches.is_empty() {
                break;
            }
        }
        matches.into_iter().min_by(|a, b| {
            (a.relative_path.len(), &a.relative_path).cmp(&(b.relative_path.len(), &b.relative_path))
        })
    }

    fn relative(
        &self,
        importer: &SourceFile,
        raw: &str,
        extensions: &[&str],
        index_files: bool,
    ) -> Option<&'f SourceFile> {
        let from_file = if let Some(absolute) = raw.strip_prefix('/') {
            normalize(absolute)
        } else {
            normalize(&join(importer.directory(), raw))
        };
        if let Some(file) = from_file.and_then(|base| self.with_extensions(&base, extensions, index_files)) {
            return Some(file);
        }
        if raw.starts_with('.') {
            return None;
        }
        normalize(raw).and_then(|base| self.with_extensions(&base, extensions, index_files))
    }

    fn dotted(&self, importer: &SourceFile, raw: &str, member: Option<&str>) -> Option<&'f SourceFile> {
        const EXTENSIONS: &[&str] = &["py", "pyi"];
        let dots = raw.chars().take_while(|c| *c == '.').count();
        let module = raw[dots..].replace('.', "/");

        let attempt = |base: &str| -> Option<&'f SourceFile> {
            let base = normalize(base)?;
            if let Some(member) = member {
                let nested = join(&base, member);
                if let Some(file) = self.python_module(&nested, EXTENSIONS) {
                    return Some(file);
                }
            }
            self.python_module(&base, EXTENSIONS)
        };

        if dots > 0 {
            let mut dir = importer.directory().to_string();
            for _ in 1..dots {
                dir = parent_dir(&dir)?.to_string();
            }
            return attempt(&join(&dir, &module));
        }

        if let Some(file) = attempt(&module) {
            return Some(file);
        }
        // Source roots such as `src/` are not on the repository root.
        if let Some(member) = member {
            if let Some(file) = self.by_suffix(&join(&module, member), EXTENSIONS) {
                return Some(file);
            }
        }
        self.by_suffix(&module, EXTENSIONS)
            .or_else(|| self.by_suffix(&join(&module, "__init__"), EXTENSIONS))
    }

    fn python_module(&self, base: &str, extensions: &[&str]) -> Option<&'f SourceFile> {
        if base.is_empty() {
            return self.with_extensions("__init__", extensions, false);
        }
        self.with_extensions(base, extensions, false)
            .filter(|file| file.relative_path != base)
            .or_else(|| self.with_extensions(&join(base, "__init__"), extensions, false))
    }

    fn package_path(&self, raw: &str, extensions: &[&str], snake_case: bool) -> Option<&'f SourceFile> {
        let raw = raw.trim_start_matches("static ").trim_end_matches(';').trim();
        let mut segments: Vec<String> = raw
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "*")
            .map(|s| if snake_case { to_snake_case(s) } else { s.to_string() })
            .collect();

        // `com.foo.Bar.member` names a member of `Bar`; retry one level up.
        for _ in 0..2 {
            if segments.is_empty() {
                return None;
            }
            if let Some(file) = self.by_suffix(&segments.join("/"), extensions) {
                return Some(file);
            }
            segments.pop();
        }
        None
    }

    fn module_path(&self, importer: &SourceFile, raw: &str) -> Option<&'f SourceFile> {
        let raw = raw.split(" as ").next().unwrap_or(raw).trim();
        let raw = match raw.find("::{") {
            Some(brace) => &raw[..brace],
            None => raw.trim_end_matches("::*"),
        };
        let mut segments: Vec<&str> = raw.split("::").map(str::trim).filter(|s| !s.is_empty()).collect();
        let first = *segments.first()?;

        let mut base = match first {
            "crate" => {
                segments.remove(0);
                self.crate_root(importer)
            }
            "self" => {
                segments.remove(0);
                rust_module_dir(importer)
            }
            "super" => {
                let mut dir = rust_module_dir(importer);
                while segments.first() == Some(&"super") {
                    segments.remove(0);
                    dir = parent_dir(&dir)?.to_string();
                }
                dir
            }
            _ => rust_module_dir(importer),
        };
        if base == "." {
            base.clear();
        }

        for k in (1..=segments.len()).rev() {
            let path = join(&base, &segments[..k].join("/"));
            if let Some(file) = self
                .lookup(&format!("{path}.rs"))
                .or_else(|| self.lookup(&format!("{path}/mod.rs")))
            {
                return Some(file);
            }
        }
        None
    }

    /// Directory holding the crate root (`lib.rs` or `main.rs`) above `importer`.
    fn crate_root(&self, importer: &SourceFile) -> String {
        let mut dir = Some(importer.directory());
        while let Some(current) = dir {
            if self.lookup(&join(current, "lib.rs")).is_some() || self.lookup(&join(current, "main.rs")).is_some() {
                return current.to_string();
            }
            dir = parent_dir(current);
        }
        importer.directory().to_string()
    }

    fn directory(&self, raw: &str) -> Option<&'f SourceFile> {
        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        for k in (1..=segments.len()).rev() {
            let suffix = segments[segments.len() - k..].join("/");
            let nested = format!("/{suffix}");
            let dir = self
                .by_dir
                .iter()
                .find(|(dir, files)| {
                    (**dir == suffix || dir.ends_with(&nested))
                        && files.iter().any(|f| f.relative_path.ends_with(".go"))
                })
                .map(|(_, files)| files);
            if let Some(files) = dir {
                return files
                    .iter()
                    .copied()
                    .filter(|f| f.relative_path.ends_with(".go"))
                    .min_by_key(|f| (f.relative_path.ends_with("_test.go"), f.relative_path.as_str()));
            }
        }
        None
    }

    fn feature(&self, importer: &SourceFile, raw: &str, extensions: &[&str]) -> Option<&'f SourceFile> {
        if let Some(file) = normalize(&join(importer.directory(), raw))
            .and_then(|base| self.with_extensions(&base, extensions, false))
        {
            return Some(file);
        }
        if raw.starts_with('.') {
            return None;
        }
        for root in ["", "lib"] {
            if let Some(file) = normalize(&join(root, raw)).and_then(|base| self.with_extensions(&base, extensions, false)) {
                return Some(file);
            }
        }
        self.by_suffix(raw, extensions)
    }

    /// The only file whose stem equals the reference's last segment.
    fn unique_stem(&self, importer: &SourceFile, raw: &str, convention: ImportConvention) -> Option<&'f SourceFile> {
        let last = raw
            .rsplit(|c: char| matches!(c, '/' | ':' | '\\'))
            .find(|s| !s.is_empty())?;
        let stem = match convention {
            ImportConvention::Dotted | ImportConvention::PackagePath { .. } => {
                last.rsplit('.').find(|s| !s.is_empty())?
            }
            _ => file_stem(last),
        };
        match self.by_stem.get(stem).map(Vec::as_slice) {
            Some([only]) if only.id != importer.id => Some(*only),
            _ => None,
        }
    }
}

fn file_stem(name: &str) -> &str {
    match name.find('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() || dir == "." {
        rest.to_string()
    } else if rest.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{rest}")
    }
}

fn parent_dir(dir: &str) -> Option<&str> {
    if dir.is_empty() {
        return None;
    }
    Some(dir.rfind('/').map_or("", |i| &dir[..i]))
}

/// Collapse `.` and `..` segments. `None` when the path leaves the repository.
fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Module directory of a Rust file: `src/net.rs` owns `src/net/`, while
/// `lib.rs`, `main.rs` and `mod.rs` own their own directory.
fn rust_module_dir(file: &SourceFile) -> String {
    let name = file.file_name();
    if matches!(name, "lib.rs" | "main.rs" | "mod.rs") {
        file.directory().to_string()
    } else {
        join(file.directory(), file_stem(name))
    }
}

fn to_snake_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    let mut prev_lower = false;
    for c in segment.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::parser::Language;

    fn files(paths: &[&str]) -> Vec<SourceFile> {
        paths
            .iter()
            .map(|p| SourceFile::new("r", p, Language::from_path(p), 1, "SourceCodeFile", "SoftwareCode"))
            .collect()
    }

    fn resolve<'f>(resolver: &ImportResolver<'f>, all: &'f [SourceFile], from: &str, raw: &str, member: Option<&str>) -> Option<&'f str> {
        let importer = all.iter().find(|f| f.relative_path == from).unwrap();
        resolver
            .resolve(importer, raw, member)
            .map(|f| f.relative_path.as_str())
    }

    #[test]
    fn test_javascript_relative() {
        let all = files(&["src/app.js", "src/util.js", "src/lib/index.ts", "src/lib/helpers.js"]);
        let r = ImportResolver::new(&all);
        assert_eq!(resolve(&r, &all, "src/app.js", "./util", None), Some("src/util.js"));
        assert_eq!(resolve(&r, &all, "src/app.js", "./lib", None), Some("src/lib/index.ts"));
        assert_eq!(resolve(&r, &all, "src/lib/helpers.js", "../util.js", None), Some("src/util.js"));
        assert_eq!(resolve(&r, &all, "src/app.js", "react", None), None);
        assert_eq!(resolve(&r, &all, "src/app.js", "../../outside", None), None);
    }

    #[test]
    fn test_python_dotted() {
        let all = files(&["pkg/__init__.py", "pkg/base.py", "pkg/sub/child.py", "pkg/sub/__init__.py", "main.py"]);
        let r = ImportResolver::new(&all);
        assert_eq!(resolve(&r, &all, "main.py", "pkg.base", None), Some("pkg/base.py"));
        assert_eq!(resolve(&r, &all, "main.py", "pkg", None), Some("pkg/__init__.py"));
        assert_eq!(resolve(&r, &all, "main.py", "pkg", Some("base")), Some("pkg/base.py"));
        assert_eq!(resolve(&r, &all, "pkg/sub/child.py", "..base", None), Some("pkg/base.py"));
        assert_eq!(resolve(&r, &all, "pkg/sub/child.py", ".", Some("child")), None);
        assert_eq!(resolve(&r, &all, "main.py", "requests", None), None);
    }

    #[test]
    fn test_python_source_root() {
        let all = files(&["src/app/core.py", "tests/test_core.py"]);
        let r = ImportResolver::new(&all);
        assert_eq!(resolve(&r, &all, "tests/test_core.py", "app.core", None), Some("src/app/core.py"));
    }

    #[test]
    fn test_java_package_path() {
        let all = files(&["src/main/java/com/acme/Widget.java", "src/main/java/com/acme/App.java"]);
        let r = ImportResolver::new(&all);
        assert_eq!(
            resolve(&r, &all, "src/main/java/com/acme/App.java", "com.acme.Widget", None),
            Some("src/main/java/com/acme/Widget.java")
        );
        assert_eq!(
            resolve(&r, &all, "src/main/java/com/acme/App.java", "com.acme.Widget.build", None),
            Some("src/main/java/com/acme/Widget.java")
        );
        assert_eq!(resolve(&r, &all, "src/main/java/com/acme/App.java", "java.util.List", None), None);
    }

    #[test]
    fn test_elixir_snake_case() {
        let all = files(&["lib/my_app/user_service.ex", "lib/my_app.ex"]);
        let r = ImportResolver::new(&all);
        assert_eq!(
            resolve(&r, &all, "lib/my_app.ex", "MyApp.UserService", None),
            Some("lib/my_app/user_service.ex")
        );
        assert_eq!(to_snake_case("HTTPClient2Go"), "httpclient2_go");
    }

    #[test]
    fn test_rust_module_path() {
        let all = files(&["src/lib.rs", "src/net.rs", "src/net/tcp.rs", "src/store/mod.rs"]);
        let r = ImportResolver::new(&all);
        assert_eq!(resolve(&r, &all, "src/net/tcp.rs", "crate::store::Store", None), Some("src/store/mod.rs"));
        assert_eq!(resolve(&r, &all, "src/net/tcp.rs", "super::Config", None), None);
        assert_eq!(resolve(&r, &all, "src/lib.rs", "net", None), Some("src/net.rs"));
        assert_eq!(resolve(&r, &all, "src/net.rs", "tcp", None), Some("src/net/tcp.rs"));
        assert_eq!(resolve(&r, &all, "src/net.rs", "self::tcp::{Listener, Stream}", None), Some("src/net/tcp.rs"));
        assert_eq!(resolve(&r, &all, "src/lib.rs", "std::collections::HashMap", None), None);
    }

    #[test]
    fn test_go_directory() {
        let all = files(&["internal/util/strings.go", "internal/util/strings_test.go", "cmd/main.go"]);
        let r = ImportResolver::new(&all);
        assert_eq!(
            resolve(&r, &all, "cmd/main.go", "github.com/acme/tool/internal/util", None),
            Some("internal/util/strings.go")
        );
        assert_eq!(resolve(&r, &all, "cmd/main.go", "fmt", None), None);
    }

    #[test]
    fn test_c_include_and_ruby_require() {
        let all = files(&["src/main.c", "src/util.h", "include/api.h", "lib/greeter.rb", "bin/run.rb"]);
        let r = ImportResolver::new(&all);
        assert_eq!(resolve(&r, &all, "src/main.c", "util.h", None), Some("src/util.h"));
        assert_eq!(resolve(&r, &all, "src/main.c", "include/api.h", None), Some("include/api.h"));
        assert_eq!(resolve(&r, &all, "src/main.c", "stdio.h", None), None);
        assert_eq!(resolve(&r, &all, "bin/run.rb", "greeter", None), Some("lib/greeter.rb"));
        assert_eq!(resolve(&r, &all, "bin/run.rb", "../lib/greeter", None), Some("lib/greeter.rb"));
    }

    #[test]
    fn test_unique_stem_fallback() {
        let all = files(&["vendor/deep/widget.py", "app.py"]);
        let r = ImportResolver::new(&all);
        assert_eq!(resolve(&r, &all, "app.py", "thirdparty.widget", None), Some("vendor/deep/widget.py"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a/./b/../c"), Some("a/c".to_string()));
        assert_eq!(normalize("../x"), None);
        assert_eq!(parent_dir("a/b"), Some("a"));
        assert_eq!(parent_dir("a"), Some(""));
        assert_eq!(parent_dir(""), None);
    }
}
