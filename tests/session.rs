use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;
use tirepl::{IOReader, Options, Session, Value};

#[derive(Clone, Default)]
struct Sink(Rc<RefCell<Vec<u8>>>);

impl Sink {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(input: &str, options: Options) -> (String, String) {
    let (out, err) = (Sink::default(), Sink::default());
    let reader = IOReader::new(Cursor::new(input.to_string()));
    Session::new(reader, options)
        .unwrap()
        .with_output(out.clone(), err.clone())
        .all()
        .unwrap();
    (out.text(), err.text())
}

#[test]
fn values_and_errors() {
    let (out, err) = run("let x = 1\nx + 1\n\n\"hi\"\nnope\n", Options::default());
    assert_eq!(out, "null\n2\n\"hi\"\n");
    assert_eq!(err, "Uncaught ReferenceError: nope is not defined\n");
}

#[test]
fn multi_line_chunks() {
    let input = "let double = fn(n) {\n  n * 2\n}\ndouble(\n  4,\n)\n";
    let (out, err) = run(input, Options::default());
    assert_eq!(out, "null\n8\n");
    assert_eq!(err, "");
}

#[test]
fn real_syntax_errors_do_not_wait() {
    let (out, err) = run("f(1 2)\n3\n", Options::default());
    assert_eq!(out, "3\n");
    assert_eq!(err, "Uncaught SyntaxError: Unexpected number\n");
}

#[test]
fn unfinished_chunk_at_end_of_input() {
    let (out, err) = run("1\nlet xs = [1,\n", Options::default());
    assert_eq!(out, "1\n");
    assert_eq!(err, "");
}

#[test]
fn no_recovery() {
    let (out, err) = run("{\n1\n", Options::default().with_recover_errors(false));
    assert_eq!(out, "1\n");
    assert_eq!(err, "Uncaught SyntaxError: Unexpected end of input\n");
}

#[test]
fn exposed_bindings() {
    let options = Options::default()
        .expose("foo", 42)
        .expose("a", 1)
        .expose("a", 2);
    let (out, _) = run("foo\na\n", options);
    assert_eq!(out, "42\n2\n");
}

#[test]
fn awaits_timers() {
    let input = "sleep(5, \"late\")\nlet p = sleep(1)\nsleep(1, [1])\n";
    let (out, err) = run(input, Options::default());
    assert_eq!(out, "\"late\"\nnull\n[1]\n");
    assert_eq!(err, "");
}

#[test]
fn rejected_promises_are_uncaught() {
    let (out, err) = run("reject(\"nope\")\n", Options::default());
    assert_eq!(out, "");
    assert_eq!(err, "Uncaught nope\n");
}

#[test]
fn promises_as_values() {
    let (out, _) = run(
        "resolve(1)\nsleep(1)\n",
        Options::default().with_eval_async(false),
    );
    assert_eq!(out, "Promise { 1 }\nPromise { <pending> }\n");
}

#[test]
fn custom_recover_pattern() {
    let options = Options::default()
        .with_recover_pattern("^Unexpected end of input$")
        .unwrap();
    let (out, err) = run("(1 + )\n2\n", options);
    assert_eq!(out, "2\n");
    assert_eq!(err, "Uncaught SyntaxError: Unexpected token ')'\n");
}

#[test]
fn context_survives_the_session() {
    let reader = IOReader::new(Cursor::new("let total = 0\ntotal = total + 5\n"));
    let mut session = Session::new(reader, Options::default())
        .unwrap()
        .with_output(io::sink(), io::sink());
    session.all().unwrap();
    assert_eq!(session.context().get("total"), Some(&Value::from(5)));
    assert!(session.context().contains("sleep"));
}

#[test]
fn self_referencing_lists() {
    let input = "let xs = []\npush(xs, xs)\nxs\nthrow xs\nxs == xs[0]\n";
    let (out, err) = run(input, Options::default());
    assert_eq!(out, "null\n1\n[[Circular]]\ntrue\n");
    assert_eq!(err, "Uncaught [[Circular]]\n");
}

#[test]
fn out_of_range_sleep() {
    let (out, err) = run("sleep(100000000000000000000000000000)\n1\n", Options::default());
    assert_eq!(out, "1\n");
    assert_eq!(
        err,
        "Uncaught RangeError: sleep() delay is out of range: 100000000000000000000000000000\n"
    );
}

#[test]
fn deeply_nested_input() {
    let input = format!("{}1{}\n2\n", "(".repeat(500), ")".repeat(500));
    let (out, err) = run(&input, Options::default());
    assert_eq!(out, "2\n");
    assert_eq!(err, "Uncaught RangeError: Maximum call stack size exceeded\n");
}
