//! Turning a code snippet into a compilable entry unit

use slimgen_core::OutputKind;

/// Namespaces every wrapped snippet imports
pub const DEFAULT_IMPORTS: &[&str] = &[
    "System",
    "System.IO",
    "System.Text",
    "System.Linq",
    "System.Security.Principal",
    "System.Collections.Generic",
    "SharpSploit.Credentials",
    "SharpSploit.Enumeration",
    "SharpSploit.Execution",
    "SharpSploit.LateralMovement",
    "SharpSploit.Generic",
    "SharpSploit.Misc",
];

const ALPHA: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// A random class name: a letter followed by hex digits
pub fn random_class_name() -> String {
    let id = uuid::Uuid::now_v7();
    let first = ALPHA[usize::from(id.as_bytes()[15]) % ALPHA.len()] as char;
    let hex = id.simple().to_string();
    format!("{}{}", first, &hex[12..])
}

/// Wrap `code` into a static class with the entry method `kind` needs
///
/// Console snippets get `static void Main()` and a trailing `return;`;
/// library snippets get `static object Execute()` and a leading `return `
/// unless they already return. Code that declares its own class is used
/// verbatim.
pub fn wrap_source(code: &str, class_name: &str, kind: OutputKind) -> String {
    let (return_type, function_name, body) = match kind {
        OutputKind::ConsoleApplication => {
            let body = if code.contains("return;") {
                code.to_string()
            } else {
                format!("{}\r\n\treturn;", code)
            };
            ("void", "Main", body)
        }
        OutputKind::DynamicallyLinkedLibrary => {
            let body = if code.contains("return;") {
                code.to_string()
            } else {
                format!("return {}", code)
            };
            ("object", "Execute", body)
        }
    };

    if body.contains(" class ") || body.contains("\nclass ") {
        return body;
    }

    let mut source = String::new();
    for namespace in DEFAULT_IMPORTS {
        source.push_str(&format!("using {};\n", namespace));
    }
    source.push_str(&format!(
        "\npublic static class {}\n{{\n    static {} {}()\n    {{\n        {}\n    }}\n}}",
        class_name, return_type, function_name, body
    ));
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_library_wrapping() {
        let source = wrap_source("\"hello\";", "Task", OutputKind::DynamicallyLinkedLibrary);
        assert!(source.starts_with("using System;\nusing System.IO;\n"));
        assert!(source.contains("using SharpSploit.Execution;\n"));
        assert!(source.ends_with(
            "public static class Task\n{\n    static object Execute()\n    {\n        return \"hello\";\n    }\n}"
        ));
    }

    #[test]
    fn test_library_keeps_explicit_return() {
        let source = wrap_source("Run(); return;", "Task", OutputKind::DynamicallyLinkedLibrary);
        assert!(source.contains("        Run(); return;\n"));
    }

    #[test]
    fn test_console_wrapping() {
        let source = wrap_source("Console.WriteLine(1);", "P", OutputKind::ConsoleApplication);
        assert!(source.contains("static void Main()"));
        assert!(source.contains("Console.WriteLine(1);\r\n\treturn;"));
    }

    #[test]
    fn test_full_class_used_verbatim() {
        let code = "using System;\npublic class Custom { static void Main() { } }";
        assert_eq!(wrap_source(code, "Ignored", OutputKind::ConsoleApplication), format!("{}\r\n\treturn;", code));

        let library = "class Lib { public static object Execute() { return null; } }";
        let wrapped = wrap_source(library, "Ignored", OutputKind::DynamicallyLinkedLibrary);
        assert_eq!(wrapped, format!("return {}", library));
    }

    #[test]
    fn test_random_class_name_is_identifier() {
        let name = random_class_name();
        assert_eq!(name.len(), 21);
        assert!(name.chars().next().unwrap().is_ascii_alphabetic());
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
