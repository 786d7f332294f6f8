use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn quire_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("quire"));
	cmd.env("NO_COLOR", "1");
	cmd
}

/// Drop a stand-in `pandoc` into a fresh `bin` directory under `dir`. The
/// script appends every argument list to `bin/pandoc-args.log` and touches
/// each `--output=` target, so builds complete without pandoc installed.
#[cfg(unix)]
pub fn install_fake_pandoc(dir: &Path) -> std::io::Result<PathBuf> {
	install_pandoc_script(
		dir,
		r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/pandoc-args.log"
for arg; do
  case "$arg" in
    --output=*) : > "${arg#--output=}" ;;
  esac
done
exit 0
"#,
	)
}

#[cfg(unix)]
pub fn install_failing_pandoc(dir: &Path) -> std::io::Result<PathBuf> {
	install_pandoc_script(dir, "#!/bin/sh\nexit 1\n")
}

#[cfg(unix)]
fn install_pandoc_script(dir: &Path, script: &str) -> std::io::Result<PathBuf> {
	use std::os::unix::fs::PermissionsExt;

	let bin = dir.join("bin");
	std::fs::create_dir_all(&bin)?;
	let pandoc = bin.join("pandoc");
	std::fs::write(&pandoc, script)?;
	std::fs::set_permissions(&pandoc, std::fs::Permissions::from_mode(0o755))?;
	Ok(bin)
}

/// The current PATH with `bin` prepended, so the stand-in pandoc wins.
#[cfg(unix)]
pub fn path_with(bin: &Path) -> String {
	match std::env::var("PATH") {
		Ok(path) => format!("{}:{}", bin.display(), path),
		Err(_) => bin.display().to_string(),
	}
}
