//! SQL scalar functions registered on every pooled connection
//!
//! `cosine_similarity(a BLOB, b BLOB) -> REAL` decodes both embedding BLOBs
//! and calls [`crate::services::similarity::cosine_similarity`]. It returns
//! NULL when either argument is not a non-empty embedding BLOB or the
//! dimensions differ, so such rows drop out of `similarity >= ?` filters.

#![allow(unsafe_code)]

use std::ffi::c_int;
use std::slice;

use libsqlite3_sys as ffi;
use sqlx::SqliteConnection;

use super::utils::bytes_to_embedding;
use crate::services::similarity::cosine_similarity;

pub const COSINE_SIMILARITY: &str = "cosine_similarity";

/// Register `cosine_similarity` on a raw connection.
pub async fn register_similarity_function(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let mut handle = conn.lock_handle().await?;
    let db = handle.as_raw_handle().as_ptr();

    // SAFETY: `db` is a live handle owned by the locked connection; the
    // function name is a static C string and no user data is attached.
    let rc = unsafe {
        ffi::sqlite3_create_function_v2(
            db,
            c"cosine_similarity".as_ptr(),
            2,
            ffi::SQLITE_UTF8 | ffi::SQLITE_DETERMINISTIC,
            std::ptr::null_mut(),
            Some(cosine_similarity_sql),
            None,
            None,
            None,
        )
    };

    if rc != ffi::SQLITE_OK {
        return Err(sqlx::Error::Configuration(
            format!("failed to register {COSINE_SIMILARITY}: sqlite error code {rc}").into(),
        ));
    }
    Ok(())
}

unsafe extern "C" fn cosine_similarity_sql(
    ctx: *mut ffi::sqlite3_context,
    argc: c_int,
    argv: *mut *mut ffi::sqlite3_value,
) {
    if argc != 2 || argv.is_null() {
        ffi::sqlite3_result_null(ctx);
        return;
    }
    let args = slice::from_raw_parts(argv, 2);

    let (Some(a), Some(b)) = (blob_embedding(args[0]), blob_embedding(args[1])) else {
        ffi::sqlite3_result_null(ctx);
        return;
    };

    match cosine_similarity(&a, &b) {
        Ok(similarity) => ffi::sqlite3_result_double(ctx, f64::from(similarity)),
        Err(_) => ffi::sqlite3_result_null(ctx),
    }
}

/// Decode a non-empty embedding BLOB argument.
unsafe fn blob_embedding(value: *mut ffi::sqlite3_value) -> Option<Vec<f32>> {
    if ffi::sqlite3_value_type(value) != ffi::SQLITE_BLOB {
        return None;
    }
    // sqlite3_value_blob must run before sqlite3_value_bytes
    let data = ffi::sqlite3_value_blob(value).cast::<u8>();
    let len = usize::try_from(ffi::sqlite3_value_bytes(value)).ok()?;
    if data.is_null() || len == 0 {
        return None;
    }
    bytes_to_embedding(slice::from_raw_parts(data, len))
}
