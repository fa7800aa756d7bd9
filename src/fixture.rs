//! Reference fixtures on disk.
//!
//! A fixture is one tensor stored as an uncompressed NumPy `.npy` file,
//! `<dir>/<name>.npy`. The extension is appended to the name unless it is
//! already there, the same way `numpy.save` does it, so consumers locate a
//! fixture by its bare name. Existing files are overwritten.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use ndarray::ArrayD;
use ndarray_npy::{ReadableElement, WritableElement};

use crate::{error::FixtureError, tensor::Tensor};

/// File extension of every fixture.
pub const EXTENSION: &str = "npy";

/// The typed content of a fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    /// Input or output values.
    Values(Tensor<T>),
    /// Positions produced by argmax, max or sort, stored as `i64`.
    Indices(Tensor<i64>),
    /// A boolean condition.
    Mask(Tensor<bool>),
}

/// A named tensor waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture<T> {
    pub name: String,
    pub payload: Payload<T>,
}

impl<T> Fixture<T> {
    #[inline]
    pub fn values(name: impl Into<String>, tensor: Tensor<T>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Values(tensor),
        }
    }

    #[inline]
    pub fn indices(name: impl Into<String>, tensor: Tensor<i64>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Indices(tensor),
        }
    }

    #[inline]
    pub fn mask(name: impl Into<String>, tensor: Tensor<bool>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Mask(tensor),
        }
    }

    /// Shape of the stored tensor.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match &self.payload {
            Payload::Values(tensor) => tensor.shape(),
            Payload::Indices(tensor) => tensor.shape(),
            Payload::Mask(tensor) => tensor.shape(),
        }
    }
}

impl<T> Fixture<T>
where
    T: WritableElement,
{
    /// Writes the fixture into `dir`.
    ///
    /// # Errors
    ///
    /// See [`save_reference`].
    pub fn save<P: AsRef<Path>>(
        &self,
        dir: P,
    ) -> Result<PathBuf, FixtureError> {
        match &self.payload {
            Payload::Values(tensor) => save_reference(tensor, dir, &self.name),
            Payload::Indices(tensor) => save_reference(tensor, dir, &self.name),
            Payload::Mask(tensor) => save_reference(tensor, dir, &self.name),
        }
    }
}

/// Path a fixture called `name` has inside `dir`.
#[must_use]
pub fn fixture_path(dir: &Path, name: &str) -> PathBuf {
    let suffix = format!(".{EXTENSION}");
    if name.ends_with(&suffix) {
        dir.join(name)
    } else {
        dir.join(format!("{name}{suffix}"))
    }
}

/// Writes `tensor` to `<dir>/<name>.npy`, creating `dir` and its parents
/// first. Returns the path written.
///
/// # Errors
///
/// Fails when the directory cannot be created or the file cannot be
/// written.
pub fn save_reference<A, P>(
    tensor: &Tensor<A>,
    dir: P,
    name: &str,
) -> Result<PathBuf, FixtureError>
where
    A: WritableElement,
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| FixtureError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = fixture_path(dir, name);
    ndarray_npy::write_npy(&path, tensor.as_array()).map_err(|source| {
        FixtureError::Write {
            path: path.clone(),
            source,
        }
    })?;

    debug!("wrote {} {:?}", path.display(), tensor.shape());
    Ok(path)
}

/// Reads the fixture called `name` back from `dir`.
///
/// # Errors
///
/// Fails when the file is missing or does not hold an array of `A`.
pub fn load_reference<A, P>(
    dir: P,
    name: &str,
) -> Result<Tensor<A>, FixtureError>
where
    A: ReadableElement,
    P: AsRef<Path>,
{
    let path = fixture_path(dir.as_ref(), name);
    let array: ArrayD<A> = ndarray_npy::read_npy(&path)
        .map_err(|source| FixtureError::Read { path, source })?;

    Ok(Tensor::from(array))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{
        error::FixtureError,
        fixture::{Fixture, fixture_path, load_reference, save_reference},
        tensor,
        tensor::Tensor,
    };

    #[test]
    fn fixture_path_appends_extension_once() {
        let dir = Path::new("data");

        assert_eq!(
            fixture_path(dir, "abs2d_abs_x"),
            dir.join("abs2d_abs_x.npy")
        );
        assert_eq!(fixture_path(dir, "ones.npy"), dir.join("ones.npy"));
    }

    #[test]
    fn save_reference_creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("data");
        let x: Tensor<f32> = tensor![[1.0, 2.0], [3.0, 4.0]];

        let path = save_reference(&x, &dir, "nested_x").unwrap();

        assert_eq!(path, dir.join("nested_x.npy"));
        assert!(path.is_file());
    }

    #[test]
    fn save_reference_round_trips_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let x: Tensor<f32> = tensor![[0.1, -0.0], [f32::MIN_POSITIVE, 1.0e-38]];

        let _ = save_reference(&x, dir.path(), "exact").unwrap();
        let back: Tensor<f32> = load_reference(dir.path(), "exact").unwrap();

        let bits = |t: &Tensor<f32>| -> Vec<u32> {
            t.as_array().iter().map(|value| value.to_bits()).collect()
        };
        assert_eq!(back.shape(), x.shape());
        assert_eq!(bits(&back), bits(&x));
    }

    #[test]
    fn save_reference_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let first: Tensor<f32> = tensor![1.0, 2.0, 3.0];
        let second: Tensor<f32> = tensor![[4.0], [5.0]];

        let _ = save_reference(&first, dir.path(), "same").unwrap();
        let _ = save_reference(&second, dir.path(), "same").unwrap();
        let back: Tensor<f32> = load_reference(dir.path(), "same").unwrap();

        assert_eq!(back, second);
    }

    #[test]
    fn index_and_mask_fixtures_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let indices = Fixture::<f32>::indices("idx", tensor![[1_i64], [0]]);
        let mask =
            Fixture::<f32>::mask("cond", tensor![[false, true], [true, false]]);

        let _ = indices.save(dir.path()).unwrap();
        let _ = mask.save(dir.path()).unwrap();

        let idx: Tensor<i64> = load_reference(dir.path(), "idx").unwrap();
        let cond: Tensor<bool> = load_reference(dir.path(), "cond").unwrap();
        assert_eq!(idx, tensor![[1_i64], [0]]);
        assert_eq!(cond, tensor![[false, true], [true, false]]);
    }

    #[test]
    fn load_reference_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = load_reference::<f32, _>(dir.path(), "missing");

        assert!(matches!(result, Err(FixtureError::Read { .. })));
    }

    #[test]
    fn save_reference_reports_uncreatable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let x: Tensor<f32> = tensor![1.0];

        let result = save_reference(&x, blocker.join("data"), "x");

        assert!(matches!(result, Err(FixtureError::CreateDir { .. })));
    }
}
