/// This is a simple example to demonstrate the usage of this library: it
/// builds the options for one GET request, sends it, and prints the text
/// body of whatever came back.

fn main() -> Result<(), onereq::Error> {
    let response = onereq::RequestOptions::new(onereq::Transport::Http, "httpbin.org", "/ip").send()?;
    println!("{}", response.raw_body);
    Ok(())
}
