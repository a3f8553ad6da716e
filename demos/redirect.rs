/// Follows a redirect chain and prints where it ended up. Note that only
/// the path of each `location` header is followed: the host stays the same
/// for the whole chain.

fn main() -> Result<(), onereq::Error> {
    let response =
        onereq::RequestOptions::new(onereq::Transport::Http, "httpbin.org", "/absolute-redirect/1")
        .with_follow_redirects(true)
        .send()?;
    println!("{} {}", response.status_code, response.reason_phrase);
    Ok(())
}
