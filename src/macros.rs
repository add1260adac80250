/// like `writeln!` but terminates the line with `"\r\n"`
macro_rules! write_line {
    ($out:expr, $fmt:expr) => (
        write!($out, concat!($fmt, "\r\n"))
    );
    ($out:expr, $fmt:expr, $($arg:tt)*) => (
        write!($out, concat!($fmt, "\r\n"), $($arg)*)
    );
}

#[cfg(test)]
macro_rules! assert_ok {
    ($val:expr) => ({
        match $val {
            Ok(val) => val,
            Err(err) => panic!("expected Ok(..) got Err({:?})", err)
        }
    });
}

#[cfg(test)]
macro_rules! assert_err {
    ($val:expr) => ({
        match $val {
            Ok(val) => panic!("expected Err(..) got Ok({:?})", val),
            Err(err) => err
        }
    });
}
