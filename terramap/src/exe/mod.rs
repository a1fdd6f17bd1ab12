use std::env::Args;

mod map;

macro_rules! print_err {
    ($err:expr, $($msg:tt)*) => {{
        use std::error::Error;
        let err = $err;
        eprint!($($msg)*);
        eprintln!(": {err}");
        let mut err_ref = err.source();
        while let Some(err) = err_ref {
            eprintln!("\tSource: {err}");
            err_ref = err.source();
        }
    }};
}
pub(crate) use print_err;

fn main() {
    terramap::logger::init();
    let mut args = std::env::args();
    args.next();
    match args.next().as_deref() {
        Some("map") => map::main(args),
        Some(x) => eprintln!("unknown command {x:?} (try `map`)"),
        None => eprintln!("usage: terramap map [--catalog=<catalog.json>] <file.map>.."),
    }
}
