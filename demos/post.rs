// A small program to post a thing to a server.

fn main() {
    let request = onereq::RequestOptions::new(onereq::Transport::Http, "httpbin.org", "/post")
        .with_method(onereq::Method::Post)
        .with_body("hello");
    match request.send() {
        Ok(response) => println!("{}", response.raw_body),
        Err(err) => println!("[ERROR]: {}", err),
    }
}
