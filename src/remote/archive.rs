use hifitime::Epoch;
use log::debug;
use reqwest::StatusCode;

use crate::{
    desipoint_errors::DesipointError,
    env_state::DesipointEnv,
    images::{archive_relative_path, ImageSample, ImageSource},
};

/// The camera image archive, `<base_url>/YYYY/MM/DD/YYYYMMDD_HHMMSS.jpg`.
#[derive(Debug, Clone)]
pub struct AllSkyArchive {
    env: DesipointEnv,
    base_url: String,
}

impl AllSkyArchive {
    pub fn new(env: DesipointEnv, base_url: &str) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        AllSkyArchive { env, base_url }
    }

    /// Address of the image captured at `capture`.
    pub fn url_for(&self, capture: Epoch) -> String {
        format!("{}{}", self.base_url, archive_relative_path(capture))
    }
}

impl ImageSource for AllSkyArchive {
    fn fetch_image(&self, capture: Epoch) -> Result<ImageSample, DesipointError> {
        let url = self.url_for(capture);
        debug!("GET {url}");

        let bytes = self.env.block_on(async {
            let response = self.env.http_client.get(&url).send().await?;
            match response.status() {
                StatusCode::NOT_FOUND => Err(DesipointError::ImageNotFound(url.clone())),
                status if !status.is_success() => Err(DesipointError::ImageNotFound(format!(
                    "{url} (HTTP {status})"
                ))),
                _ => Ok(response.bytes().await?),
            }
        })?;

        ImageSample::decode(capture, &bytes)
    }
}

#[cfg(test)]
mod archive_test {
    use super::*;
    use crate::constants::DEFAULT_IMAGE_BASE_URL;

    #[test]
    fn test_url_for() {
        let env = DesipointEnv::new().unwrap();
        let capture = Epoch::from_gregorian_utc_hms(2020, 3, 16, 2, 30, 5);

        let archive = AllSkyArchive::new(env.clone(), DEFAULT_IMAGE_BASE_URL);
        assert_eq!(
            archive.url_for(capture),
            "http://varuna.kpno.noirlab.edu/allsky-all/images/cropped/2020/03/16/20200316_023005.jpg"
        );

        let no_slash = AllSkyArchive::new(env, "http://localhost:8000/images");
        assert_eq!(
            no_slash.url_for(capture),
            "http://localhost:8000/images/2020/03/16/20200316_023005.jpg"
        );
    }
}
