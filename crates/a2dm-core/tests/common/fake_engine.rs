//! A small aria2c stand-in for integration tests.
//!
//! The script accepts the argv the manager builds (ignoring flags it does
//! not care about), emits real-format readout lines, keeps a byte-count
//! control file next to the output so `-c` resumes where it left off, and
//! exits 7 on SIGTERM the way the engine does mid-download.
//!
//! Test knobs ride in as extra argv entries: `--fe-total=N`, `--fe-step=N`,
//! `--fe-sleep=SECS`, `--fe-fail-at=N`, `--fe-ignore-term`. It also writes
//! `<out>.pid` at startup and `<out>.term` when it receives SIGTERM, so
//! tests can check process fate from the outside.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const SCRIPT: &str = r#"#!/bin/sh
dir="."
out="out.bin"
total=100
step=10
sleep_s=0.05
fail_at=""
ignore_term=0

while [ $# -gt 0 ]; do
    case "$1" in
        -d) dir="$2"; shift 2 ;;
        -o) out="$2"; shift 2 ;;
        --fe-total=*) total="${1#*=}"; shift ;;
        --fe-step=*) step="${1#*=}"; shift ;;
        --fe-sleep=*) sleep_s="${1#*=}"; shift ;;
        --fe-fail-at=*) fail_at="${1#*=}"; shift ;;
        --fe-ignore-term) ignore_term=1; shift ;;
        *) shift ;;
    esac
done

ctrl="$dir/$out.aria2"
printf '%s' "$$" > "$dir/$out.pid"

done_b=0
if [ -f "$ctrl" ]; then
    done_b=$(cat "$ctrl")
    echo "resuming from control file at ${done_b}B"
else
    echo "starting download of $out"
fi
[ -f "$dir/$out" ] || : > "$dir/$out"
printf '%s' "$done_b" > "$ctrl"

if [ "$ignore_term" = 1 ]; then
    trap '' TERM
else
    trap 'printf "%s" "$done_b" > "$ctrl"; : > "$dir/$out.term"; exit 7' TERM INT
fi

while [ "$done_b" -lt "$total" ]; do
    sleep "$sleep_s"
    done_b=$((done_b + step))
    [ "$done_b" -gt "$total" ] && done_b=$total
    printf '%s' "$done_b" > "$ctrl"
    pct=$((done_b * 100 / total))
    echo "[#deadbeef ${done_b}B/${total}B(${pct}%) CN:4 DL:${step}B ETA:9s]"
    if [ -n "$fail_at" ] && [ "$done_b" -ge "$fail_at" ]; then
        echo "error: simulated transfer failure" >&2
        exit 1
    fi
done

printf 'a2dm-test-payload' > "$dir/$out"
rm -f "$ctrl"
echo "Download complete: $dir/$out"
exit 0
"#;

/// Writes the fake engine script into `dir` and returns its path.
pub fn install(dir: &Path) -> PathBuf {
    let path = dir.join("fake-aria2c.sh");
    fs::write(&path, SCRIPT).expect("write fake engine");
    let mut perms = fs::metadata(&path).expect("stat fake engine").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake engine");
    path
}
