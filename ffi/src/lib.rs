//! C-ABI wrapper around `posts-core`.
//!
//! # Overview
//! Exposes the posts list/create/update/delete API through `extern "C"`
//! functions so a native host can build requests and parse responses without
//! linking against serde or an async runtime. The host owns the network.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `posts_build_*` / `posts_parse_*` mirror `PostsClient` one to one.
//! - A single `FfiPostsResult` envelope with `FfiDataTag` + `void* data`
//!   carries success payloads and errors uniformly.
//! - The caller owns every returned pointer and releases it with the
//!   matching `posts_free_*` function.

pub mod types;

#[cfg(test)]
mod host_tests;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};
use std::time::Duration;

use posts_core::{ApiError, ClientConfig, HttpResponse, NewPost, PostPatch, PostsClient};

use types::*;

/// Borrow a C string as `&str`. Invalid UTF-8 reads as empty.
///
/// # Safety
/// `ptr` must be non-null and point to a NUL-terminated string that outlives
/// the returned reference.
unsafe fn str_arg<'a>(ptr: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("")
}

/// Like `str_arg`, but null maps to `None`.
unsafe fn opt_string_arg(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { str_arg(ptr) }.to_string())
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a `PostsClient` bound to `base_url`.
///
/// `timeout_ms` is the per-request timeout copied into every built request;
/// 0 selects the default of 1000 ms.
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `posts_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn posts_client_new(
    base_url: *const c_char,
    timeout_ms: u64,
) -> *mut FfiPostsClient {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let mut config = ClientConfig::new(unsafe { str_arg(base_url) });
        if timeout_ms > 0 {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        let client = PostsClient::new(config);
        Box::into_raw(Box::new(FfiPostsClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `posts_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_client_free(client: *mut FfiPostsClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the request listing every post.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `posts_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn posts_build_list(client: *const FfiPostsClient) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_list_posts())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request creating a post.
///
/// Returns null if `client`, `title` or `body` is null, or if serialization
/// fails.
#[unsafe(no_mangle)]
pub extern "C" fn posts_build_create(
    client: *const FfiPostsClient,
    user_id: u64,
    title: *const c_char,
    body: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || title.is_null() || body.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let input = NewPost {
            user_id,
            title: unsafe { str_arg(title) }.to_string(),
            body: unsafe { str_arg(body) }.to_string(),
        };
        match client.inner.build_create_post(&input) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request updating post `id`.
///
/// Each field is optional: a negative `user_id` and a null `title` or `body`
/// leave that field out of the patch.
/// Returns null if `client` is null, or if serialization fails.
#[unsafe(no_mangle)]
pub extern "C" fn posts_build_update(
    client: *const FfiPostsClient,
    id: u64,
    user_id: i64,
    title: *const c_char,
    body: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let patch = PostPatch {
            user_id: u64::try_from(user_id).ok(),
            title: unsafe { opt_string_arg(title) },
            body: unsafe { opt_string_arg(body) },
        };
        match client.inner.build_update_post(id, &patch) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request deleting post `id`.
///
/// Returns null if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_build_delete(
    client: *const FfiPostsClient,
    id: u64,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_delete_post(id))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Copy an `FfiHttpResponse` into a core `HttpResponse`. A null body reads
/// as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { str_arg(resp.body) }.to_string()
    };
    HttpResponse::new(resp.status, body)
}

/// Shared shape of every `posts_parse_*` function: null checks, panic guard
/// and error mapping around one `PostsClient` parse call.
fn parse_with<T>(
    name: &str,
    client: *const FfiPostsClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&PostsClient, HttpResponse) -> Result<T, ApiError> + UnwindSafe,
    ok: impl FnOnce(T) -> *mut FfiPostsResult + UnwindSafe,
) -> *mut FfiPostsResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiPostsResult::null_arg("client");
        }
        if response.is_null() {
            return FfiPostsResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match parse(&client.inner, ffi_response_to_core(resp)) {
            Ok(value) => ok(value),
            Err(e) => FfiPostsResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiPostsResult::panic(&format!("panic in {name}")))
}

/// Parse the response to a list request.
///
/// Returns a result with `data_tag = PostList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn posts_parse_list(
    client: *const FfiPostsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostsResult {
    parse_with(
        "posts_parse_list",
        client,
        response,
        PostsClient::parse_list_posts,
        FfiPostsResult::ok_post_list,
    )
}

/// Parse the response to a create request.
///
/// Returns a result with `data_tag = Post` on success.
#[unsafe(no_mangle)]
pub extern "C" fn posts_parse_create(
    client: *const FfiPostsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostsResult {
    parse_with(
        "posts_parse_create",
        client,
        response,
        PostsClient::parse_create_post,
        FfiPostsResult::ok_post,
    )
}

/// Parse the response to an update request.
///
/// Returns a result with `data_tag = Post` on success.
#[unsafe(no_mangle)]
pub extern "C" fn posts_parse_update(
    client: *const FfiPostsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostsResult {
    parse_with(
        "posts_parse_update",
        client,
        response,
        PostsClient::parse_update_post,
        FfiPostsResult::ok_post,
    )
}

/// Parse the response to a delete request. The body is not inspected.
///
/// Returns a result with `data_tag = None` on any 2xx status.
#[unsafe(no_mangle)]
pub extern "C" fn posts_parse_delete(
    client: *const FfiPostsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPostsResult {
    parse_with(
        "posts_parse_delete",
        client,
        response,
        PostsClient::parse_delete_post,
        |()| FfiPostsResult::ok_empty(),
    )
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `posts_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.path.is_null() {
            drop(unsafe { CString::from_raw(req.path) });
        }
        if !req.body.is_null() {
            drop(unsafe { CString::from_raw(req.body) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Vec::from_raw_parts(req.headers, req.headers_len as usize, req.headers_len as usize)
            };
            for h in headers {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiPostsResult` returned by any `posts_parse_*` function.
/// Safe to call with null. `data_tag` decides what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_result(result: *mut FfiPostsResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Post => {
                let post = unsafe { Box::from_raw(result.data as *mut FfiPost) };
                free_post_fields(&post);
            }
            FfiDataTag::PostList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiPostList) };
                if !list.items.is_null() && list.len > 0 {
                    let items = unsafe {
                        Vec::from_raw_parts(list.items, list.len as usize, list.len as usize)
                    };
                    items.iter().for_each(free_post_fields);
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
