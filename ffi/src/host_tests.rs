//! Play a native host against the live mock server: read each
//! `FfiHttpRequest` field by field, execute it with ureq, and hand the raw
//! status and body back through `posts_parse_*`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::types::*;
use crate::*;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn c_str(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
}

/// Execute and free `req`, returning the status and body text.
fn execute(req: *mut FfiHttpRequest) -> (u16, CString) {
    assert!(!req.is_null());
    let r = unsafe { &*req };
    let path = c_str(r.path);
    let body = (!r.body.is_null()).then(|| c_str(r.body));

    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(std::time::Duration::from_millis(r.timeout_ms)))
        .build()
        .new_agent();
    let result = match (&r.method, body) {
        (FfiHttpMethod::Get, _) => agent.get(&path).call(),
        (FfiHttpMethod::Delete, _) => agent.delete(&path).call(),
        (FfiHttpMethod::Post, Some(b)) => agent
            .post(&path)
            .content_type("application/json")
            .send(b.as_bytes()),
        (FfiHttpMethod::Put, Some(b)) => agent
            .put(&path)
            .content_type("application/json")
            .send(b.as_bytes()),
        (_, None) => panic!("write request without body"),
    };
    posts_free_request(req);

    let mut response = result.unwrap();
    let status = response.status().as_u16();
    let text = response.body_mut().read_to_string().unwrap();
    (status, CString::new(text).unwrap())
}

fn parse(
    client: *const FfiPostsClient,
    req: *mut FfiHttpRequest,
    parser: extern "C" fn(*const FfiPostsClient, *const FfiHttpResponse) -> *mut FfiPostsResult,
) -> *mut FfiPostsResult {
    let (status, body) = execute(req);
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    parser(client, &resp)
}

fn list_titles(client: *const FfiPostsClient) -> Vec<String> {
    let result = parse(client, posts_build_list(client), posts_parse_list);
    let r = unsafe { &*result };
    assert!(matches!(r.error_code, FfiErrorCode::Ok));
    let list = unsafe { &*(r.data as *const FfiPostList) };
    let titles = if list.len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(list.items, list.len as usize) }
            .iter()
            .map(|p| c_str(p.title))
            .collect()
    };
    posts_free_result(result);
    titles
}

#[test]
fn crud_through_the_c_surface() {
    let url = CString::new(start_server()).unwrap();
    let client = posts_client_new(url.as_ptr(), 0);
    assert!(list_titles(client).is_empty());

    // create
    let title = CString::new("Hello").unwrap();
    let body = CString::new("World").unwrap();
    let result = parse(
        client,
        posts_build_create(client, 1, title.as_ptr(), body.as_ptr()),
        posts_parse_create,
    );
    let r = unsafe { &*result };
    assert!(matches!(r.error_code, FfiErrorCode::Ok));
    let id = unsafe { &*(r.data as *const FfiPost) }.id;
    posts_free_result(result);

    // update title only
    let new_title = CString::new("Hi").unwrap();
    let result = parse(
        client,
        posts_build_update(client, id, -1, new_title.as_ptr(), std::ptr::null()),
        posts_parse_update,
    );
    let post = unsafe { &*((*result).data as *const FfiPost) };
    assert_eq!(c_str(post.title), "Hi");
    assert_eq!(c_str(post.body), "World");
    posts_free_result(result);
    assert_eq!(list_titles(client), vec!["Hi"]);

    // delete, then delete again
    let result = parse(client, posts_build_delete(client, id), posts_parse_delete);
    assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::Ok));
    posts_free_result(result);

    let result = parse(client, posts_build_delete(client, id), posts_parse_delete);
    let r = unsafe { &*result };
    assert!(matches!(r.error_code, FfiErrorCode::NotFound));
    assert_eq!(r.http_status, 404);
    posts_free_result(result);

    assert!(list_titles(client).is_empty());
    posts_client_free(client);
}
