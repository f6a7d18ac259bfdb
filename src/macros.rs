macro_rules! emit {
    ($emitter:expr, $code:expr) => {
        $emitter.emit($code)
    };

    ($emitter:expr, $($format:tt)*) => {
        $emitter.emit(&format!($($format)*))
    };
}

macro_rules! emit_line {
    ($emitter:expr, $code:expr) => {
        $emitter.emit_line($code)
    };

    ($emitter:expr, $($format:tt)*) => {
        $emitter.emit_line(&format!($($format)*))
    };
}
