//! Tracer behaviour against the genuine libc functions
//!
//! Every test drives a `Tracer` with `libc::fopen`/`open`/`close` as the
//! real implementation and a capturing sink.

use std::ffi::CString;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use filehook::util::HookGuard;
use filehook::{CallRecord, Function, RecordSink, Tracer, TracingSink};
use nix::errno::Errno;

/// Keeps every rendered line
#[derive(Default)]
struct Capture {
	lines: Mutex<Vec<String>>,
}

impl Capture {
	fn lines(&self) -> Vec<String> {
		self.lines.lock().unwrap().clone()
	}
}

impl RecordSink for Capture {
	fn record(&self, record: &CallRecord<'_>) {
		let line = String::from_utf8(record.to_line()).unwrap();
		self.lines.lock().unwrap().push(line);
	}
}

/// Clobbers errno while recording, like a sink doing real I/O might
struct NoisySink;

impl RecordSink for NoisySink {
	fn record(&self, _record: &CallRecord<'_>) {
		Errno::set_raw(libc::EIO);
	}
}

fn capturing_tracer() -> (Tracer, Arc<Capture>) {
	let capture = Arc::new(Capture::default());
	let tracer = filehook::new().sink(Arc::clone(&capture)).build();
	(tracer, capture)
}

fn cstring(path: &Path) -> CString {
	CString::new(path.as_os_str().as_encoded_bytes()).unwrap()
}

#[test]
fn fopen_returns_writable_handle_and_logs_path_and_mode() {
	let (tracer, capture) = capturing_tracer();
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("test.txt");
	let cpath = cstring(&path);

	unsafe {
		let file = tracer.fopen(libc::fopen, cpath.as_ptr(), c"w".as_ptr());
		assert!(!file.is_null());
		assert!(libc::fputs(c"through the layer\n".as_ptr(), file) >= 0);
		assert_eq!(libc::fclose(file), 0);
	}

	assert_eq!(std::fs::read_to_string(&path).unwrap(), "through the layer\n");

	let lines = capture.lines();
	assert_eq!(lines.len(), 1);
	let expected_prefix = format!("### fopen( {}, w) = 0x", path.display());
	assert!(lines[0].starts_with(&expected_prefix), "unexpected line {:?}", lines[0]);
	assert!(lines[0].ends_with('\n'));
}

#[test]
fn fopen_failure_is_logged_and_returned_unchanged() {
	let (tracer, capture) = capturing_tracer();
	let path = c"/nonexistent/dir/file";

	let traced = unsafe { tracer.fopen(libc::fopen, path.as_ptr(), c"r".as_ptr()) };
	assert!(traced.is_null());
	assert_eq!(Errno::last(), Errno::ENOENT);

	assert_eq!(capture.lines(), vec!["### fopen( /nonexistent/dir/file, r) = (nil)\n".to_string()]);
	assert_eq!(tracer.stats().failures(Function::Fopen), 1);
}

#[test]
fn fopen_keeps_errno_of_genuine_call() {
	let tracer = filehook::new().sink(NoisySink).build();
	let path = c"/nonexistent/dir/file";

	unsafe {
		let direct = libc::fopen(path.as_ptr(), c"r".as_ptr());
		let direct_errno = Errno::last_raw();
		assert!(direct.is_null());

		Errno::clear();
		let traced = tracer.fopen(libc::fopen, path.as_ptr(), c"r".as_ptr());
		assert!(traced.is_null());
		assert_eq!(Errno::last_raw(), direct_errno);
	}
}

#[test]
fn open_with_create_forwards_mode() {
	let (tracer, capture) = capturing_tracer();
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("created");
	let cpath = cstring(&path);
	let flags = libc::O_WRONLY | libc::O_CREAT | libc::O_EXCL;

	let fd = unsafe { tracer.open(libc::open, cpath.as_ptr(), flags, 0o600) };
	assert!(fd >= 0);
	assert_eq!(unsafe { libc::close(fd) }, 0);

	// 0o600 survives any umask that leaves the owner bits alone.
	let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
	assert_eq!(mode, 0o600);

	let expected = format!("### open( {}, {}, 0600) = {}\n", path.display(), flags, fd);
	assert_eq!(capture.lines(), vec![expected]);
}

#[test]
fn open_without_create_ignores_mode_argument() {
	let (tracer, capture) = capturing_tracer();
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("existing");
	std::fs::write(&path, b"data").unwrap();
	let cpath = cstring(&path);

	let fd = unsafe { tracer.open(libc::open, cpath.as_ptr(), libc::O_RDONLY, 0xdead) };
	assert!(fd >= 0);
	assert_eq!(unsafe { libc::close(fd) }, 0);

	let expected = format!("### open( {}, {}) = {}\n", path.display(), libc::O_RDONLY, fd);
	assert_eq!(capture.lines(), vec![expected]);
}

#[test]
fn open_failure_matches_direct_call_and_keeps_errno() {
	let tracer = filehook::new().sink(NoisySink).build();
	let path = c"/nonexistent/dir/file";

	unsafe {
		let direct = libc::open(path.as_ptr(), libc::O_RDONLY);
		let direct_errno = Errno::last_raw();

		Errno::clear();
		let traced = tracer.open(libc::open, path.as_ptr(), libc::O_RDONLY, 0);
		assert_eq!(traced, direct);
		assert_eq!(traced, -1);
		assert_eq!(Errno::last_raw(), direct_errno);
		assert_eq!(Errno::last(), Errno::ENOENT);
	}
}

#[test]
fn close_twice_returns_ebadf_and_logs_both() {
	let (tracer, capture) = capturing_tracer();
	let fd = unsafe { libc::open(c"/dev/null".as_ptr(), libc::O_RDONLY) };
	assert!(fd >= 0);

	unsafe {
		assert_eq!(tracer.close(libc::close, fd), 0);
		assert_eq!(tracer.close(libc::close, fd), -1);
	}
	assert_eq!(Errno::last(), Errno::EBADF);

	assert_eq!(
		capture.lines(),
		vec![format!("### close({}) = 0\n", fd), format!("### close({}) = -1\n", fd)]
	);

	let stats = tracer.stats();
	assert_eq!(stats.calls(Function::Close), 2);
	assert_eq!(stats.failures(Function::Close), 1);
}

#[test]
fn nested_calls_are_forwarded_but_not_recorded() {
	let (tracer, capture) = capturing_tracer();

	let _outer = HookGuard::enter();
	assert_eq!(unsafe { tracer.close(libc::close, -1) }, -1);
	assert_eq!(Errno::last(), Errno::EBADF);

	assert!(capture.lines().is_empty());
	assert_eq!(tracer.stats().total(), 0);
}

#[test]
fn concurrent_calls_produce_one_complete_line_each() {
	const THREADS: usize = 8;
	const ROUNDS: usize = 50;

	let (tracer, capture) = capturing_tracer();
	let tracer = Arc::new(tracer);

	let handles: Vec<_> = (0..THREADS)
		.map(|_| {
			let tracer = Arc::clone(&tracer);
			std::thread::spawn(move || {
				for _ in 0..ROUNDS {
					unsafe {
						let fd = tracer.open(libc::open, c"/dev/null".as_ptr(), libc::O_RDONLY, 0);
						assert!(fd >= 0);
						assert_eq!(tracer.close(libc::close, fd), 0);
					}
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	let lines = capture.lines();
	assert_eq!(lines.len(), THREADS * ROUNDS * 2);
	let opens = lines.iter().filter(|l| l.starts_with("### open( /dev/null, 0) = ")).count();
	let closes = lines.iter().filter(|l| l.starts_with("### close(") && l.ends_with(") = 0\n")).count();
	assert_eq!(opens, THREADS * ROUNDS);
	assert_eq!(closes, THREADS * ROUNDS);
	assert_eq!(tracer.stats().total(), THREADS * ROUNDS * 2);
}

#[test]
fn tracing_sink_emits_structured_event() {
	#[derive(Clone, Default)]
	struct Buffer(Arc<Mutex<Vec<u8>>>);

	impl std::io::Write for Buffer {
		fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	let buffer = Buffer::default();
	let writer = buffer.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(move || writer.clone())
		.with_ansi(false)
		.with_max_level(tracing::Level::DEBUG)
		.finish();

	let tracer = filehook::new().sink(TracingSink::new()).build();
	tracing::subscriber::with_default(subscriber, || unsafe {
		tracer.close(libc::close, -1);
	});

	let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
	assert!(output.contains("intercepted call"), "{}", output);
	assert!(output.contains("fd=-1"), "{}", output);
	assert!(output.contains("result=-1"), "{}", output);
}

#[test]
fn record_strings_borrow_caller_arguments() {
	let record = unsafe { CallRecord::open(c"/etc/hosts".as_ptr(), libc::O_RDONLY, None, 3) };
	match record {
		CallRecord::Open { path, .. } => assert_eq!(path, Some(c"/etc/hosts")),
		other => panic!("unexpected record {:?}", other),
	}
	assert_eq!(record.function(), Function::Open);
	assert!(!record.failed());
}
