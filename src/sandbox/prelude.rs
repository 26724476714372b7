use super::{ProtectedRoot, RootScope, SandboxPolicy};
use itertools::Itertools;

const OPEN_SECTION: &str = r#"def __turtcd_sandbox__():
    import builtins
    import functools
    import io
    import os
    import shutil

    def _describe(path):
        if isinstance(path, bytes):
            return os.fsdecode(path)
        return os.fspath(path)

    def _deny(operation, path):
        raise PermissionError(13, "sandbox: " + operation + " is not permitted", _describe(path))

"#;

const RESTRICTED_CHECK: &str = r#"    def _check(operation, path):
        _deny(operation, path)

"#;

const LIMITED_CHECK_HEAD: &str = r#"    def _resolve(path):
        return os.path.normcase(os.path.realpath(os.path.abspath(_describe(path))))

    def _inside(target, root, tree):
        if target == root:
            return True
        if tree:
            return target.startswith(root.rstrip(os.sep) + os.sep)
        return os.path.dirname(target) == root

"#;

const LIMITED_CHECK_TAIL: &str = r#"    def _check(operation, path):
        target = _resolve(path)
        for root, tree in _protected:
            if _inside(target, root, tree):
                _deny(operation, path)

"#;

const INSTALL_SECTION: &str = r#"    def _guarded(operation, target):
        if target is None or isinstance(target, int):
            return
        try:
            os.fspath(target)
        except TypeError:
            return
        _check(operation, target)

    def _relative_to_fd(kwargs):
        return any(kwargs.get(key) is not None for key in ("dir_fd", "src_dir_fd", "dst_dir_fd"))

    def _wrap(operation, func, params):
        @functools.wraps(func)
        def wrapper(*args, **kwargs):
            if not _relative_to_fd(kwargs):
                for index, name in params:
                    if index < len(args):
                        _guarded(operation, args[index])
                    elif name in kwargs:
                        _guarded(operation, kwargs[name])
            return func(*args, **kwargs)
        return wrapper

    _open = builtins.open

    @functools.wraps(_open)
    def _sandboxed_open(file, mode="r", *args, **kwargs):
        if any(flag in mode for flag in "wax+"):
            _guarded("open-for-write", file)
        return _open(file, mode, *args, **kwargs)

    builtins.open = _sandboxed_open
    io.open = _sandboxed_open

    _os_open = os.open
    _write_flags = os.O_WRONLY | os.O_RDWR | os.O_CREAT | os.O_TRUNC | os.O_APPEND

    @functools.wraps(_os_open)
    def _sandboxed_os_open(path, flags, *args, **kwargs):
        if flags & _write_flags and not _relative_to_fd(kwargs):
            _guarded("open-for-write", path)
        return _os_open(path, flags, *args, **kwargs)

    os.open = _sandboxed_os_open

    for module, name, operation, params in (
        (os, "mkdir", "make-directory", ((0, "path"),)),
        (os, "makedirs", "make-directory", ((0, "name"),)),
        (os, "remove", "delete-file", ((0, "path"),)),
        (os, "unlink", "delete-file", ((0, "path"),)),
        (os, "rmdir", "delete-directory", ((0, "path"),)),
        (os, "removedirs", "delete-directory", ((0, "name"),)),
        (os, "rename", "rename", ((0, "src"), (1, "dst"))),
        (os, "replace", "rename", ((0, "src"), (1, "dst"))),
        (os, "truncate", "truncate", ((0, "path"),)),
        (shutil, "rmtree", "recursive-delete", ((0, "path"),)),
        (shutil, "copy", "copy", ((1, "dst"),)),
        (shutil, "copy2", "copy", ((1, "dst"),)),
        (shutil, "copyfile", "copy", ((1, "dst"),)),
        (shutil, "copytree", "copy", ((1, "dst"),)),
        (shutil, "move", "move", ((0, "src"), (1, "dst"))),
    ):
        original = getattr(module, name, None)
        if original is not None:
            setattr(module, name, _wrap(operation, original, params))


__turtcd_sandbox__()
del __turtcd_sandbox__
"#;

pub(super) fn render(policy: &SandboxPolicy) -> String {
    let check = match policy {
        SandboxPolicy::Full => return String::new(),
        SandboxPolicy::Restricted => RESTRICTED_CHECK.to_string(),
        SandboxPolicy::Limited { protected } => limited_check(protected),
    };

    let mut prelude = format!("# sandbox prelude (policy: {})\n", policy.level());
    prelude.push_str(OPEN_SECTION);
    prelude.push_str(&check);
    prelude.push_str(INSTALL_SECTION);
    prelude.push('\n');
    prelude
}

fn limited_check(protected: &[ProtectedRoot]) -> String {
    let entries = protected
        .iter()
        .map(|root| {
            let tree = match root.scope {
                RootScope::Tree => "True",
                RootScope::Shallow => "False",
            };
            format!(
                "        ({}, {}),\n",
                string_literal(&root.path.to_string_lossy()),
                tree
            )
        })
        .join("");

    format!(
        "{LIMITED_CHECK_HEAD}    _protected = [(_resolve(path), tree) for path, tree in [\n{entries}    ]]\n\n{LIMITED_CHECK_TAIL}"
    )
}

/// Quotes text as a double-quoted literal. JSON string escapes are a subset of the
/// escapes the interpreter accepts, so the JSON encoding is reused as is.
fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_escapes_quotes_and_backslashes() {
        assert_eq!(string_literal(r#"C:\dir "x""#), r#""C:\\dir \"x\"""#);
    }

    #[test]
    fn limited_check_lists_every_root_with_scope() {
        let check = limited_check(&[
            ProtectedRoot {
                path: "/srv/app/projects".into(),
                scope: RootScope::Tree,
            },
            ProtectedRoot {
                path: "/srv/app".into(),
                scope: RootScope::Shallow,
            },
        ]);
        assert!(check.contains("(\"/srv/app/projects\", True),"));
        assert!(check.contains("(\"/srv/app\", False),"));
        assert!(check.contains("def _check(operation, path):"));
    }
}
