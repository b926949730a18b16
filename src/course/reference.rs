//! Course reference extraction.
//!
//! A course is addressed by its study page URL, e.g.
//! `http://welearn.sflep.com/Student/StudyCourse.aspx?cid=1234&classid=123456`.

use crate::error::{PilotError, Result};
use url::Url;

/// Extract `(course_id, class_id)` from a course study page URL.
///
/// Both the `cid` and `classid` query parameters must be present.
pub fn parse_course_reference(raw: &str) -> Result<(String, String)> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PilotError::MalformedReference(format!("not a URL: {e}")))?;

    let mut course_id = None;
    let mut class_id = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "cid" => course_id = Some(value.into_owned()),
            "classid" => class_id = Some(value.into_owned()),
            _ => {}
        }
    }

    match (course_id, class_id) {
        (Some(cid), Some(classid)) if !cid.is_empty() && !classid.is_empty() => {
            Ok((cid, classid))
        }
        _ => Err(PilotError::MalformedReference(
            "both cid and classid query parameters are required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_reference() {
        let (cid, classid) = parse_course_reference(
            "http://welearn.sflep.com/Student/StudyCourse.aspx?cid=1234&classid=123456",
        )
        .unwrap();
        assert_eq!(cid, "1234");
        assert_eq!(classid, "123456");
    }

    #[test]
    fn test_parse_is_left_inverse_of_construction() {
        for (cid, classid) in [("1", "2"), ("987", "654321"), ("a-b", "c_d")] {
            let url = format!(
                "http://welearn.sflep.com/Student/StudyCourse.aspx?cid={cid}&classid={classid}"
            );
            assert_eq!(
                parse_course_reference(&url).unwrap(),
                (cid.to_string(), classid.to_string())
            );
        }
    }

    #[test]
    fn test_parse_rejects_missing_params() {
        assert!(parse_course_reference("http://w/x.aspx?cid=1").is_err());
        assert!(parse_course_reference("http://w/x.aspx?classid=2").is_err());
        assert!(parse_course_reference("http://w/x.aspx").is_err());
        assert!(parse_course_reference("not a url").is_err());
    }
}
