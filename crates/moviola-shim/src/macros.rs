/// Log a hook-level event with a category tag, formatted on the stack.
///
/// ```ignore
/// hook_log!(Category::FileIo, "open call with file {} and flag {:#x}", path, oflag);
/// ```
#[macro_export]
macro_rules! hook_log {
    ($cat:expr, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        let mut buf = [0u8; 512];
        let mut writer = $crate::logsink::StackWriter::new(&mut buf);
        let _ = write!(writer, "[{}] ", $crate::logsink::Category::tag($cat));
        let _ = write!(writer, $($arg)*);
        let _ = writeln!(writer);
        $crate::logsink::LOGGER.log(writer.as_str());
    }};
}

/// Typed view of a cached real-symbol slot.
///
/// Evaluates to `Option<fn>`: `None` when resolution failed, in which case
/// the hook must degrade to its neutral error value instead of calling
/// through.
#[macro_export]
macro_rules! real_fn {
    ($sym:expr, $t:ty) => {
        $sym.get()
            .map(|p| unsafe { std::mem::transmute::<*mut libc::c_void, $t>(p) })
    };
}
