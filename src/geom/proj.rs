use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::geom::Geometries;

/// Every geometry handled by a run is expressed in WGS84 lon/lat.
pub const REFERENCE_EPSG: u32 = 4326;

/// TIGER/Line shapefiles ship in NAD83 lon/lat.
pub const SOURCE_EPSG: u32 = 4269;

/// PROJ.4 string for the supported geographic systems.
fn geog_proj4(epsg: u32) -> Result<&'static str> {
    match epsg {
        4269 | 4937 => Ok("+proj=longlat +datum=NAD83 +no_defs +type=crs"),
        4326 => Ok("+proj=longlat +datum=WGS84 +no_defs +type=crs"),
        _ => bail!("Unsupported source CRS: EPSG:{epsg}"),
    }
}

impl Geometries {
    /// Reproject shapes into the reference system (EPSG:4326).
    pub fn to_reference(&self) -> Result<Geometries> {
        if self.epsg() == REFERENCE_EPSG {
            return Ok(Geometries::new(self.shapes().to_vec(), Some(REFERENCE_EPSG)));
        }

        let from = {
            let proj_string = geog_proj4(self.epsg())?;
            Proj4::from_proj_string(proj_string)
                .map_err(|e| anyhow!("{e:?}"))
                .with_context(|| format!("failed to build source PROJ.4: {proj_string}"))?
        };
        let to = {
            let proj_string = geog_proj4(REFERENCE_EPSG)?;
            Proj4::from_proj_string(proj_string)
                .map_err(|e| anyhow!("{e:?}"))
                .with_context(|| format!("failed to build target PROJ.4: {proj_string}"))?
        };

        // Degrees -> radians in, radians -> degrees out.
        let projected = self.shapes().iter()
            .map(|shape| shape.try_map_coords(|coord: Coord<f64>| {
                let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
                transform(&from, &to, &mut point).map_err(|e| anyhow!("CRS transform failed: {e:?}"))?;
                Ok::<_, anyhow::Error>(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
            }))
            .collect::<Result<Vec<MultiPolygon<f64>>>>()?;

        Ok(Geometries::new(projected, Some(REFERENCE_EPSG)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn nad83_to_wgs84_moves_less_than_a_micro_degree() {
        let shape = MultiPolygon(vec![polygon![
            (x: -95.4, y: 29.7), (x: -95.3, y: 29.7), (x: -95.3, y: 29.8), (x: -95.4, y: 29.8),
        ]]);
        let geoms = Geometries::new(vec![shape.clone()], Some(SOURCE_EPSG));
        let projected = geoms.to_reference().unwrap();

        assert_eq!(projected.epsg(), REFERENCE_EPSG);
        let before = shape.0[0].exterior().0[0];
        let after = projected.shapes()[0].0[0].exterior().0[0];
        assert!((before.x - after.x).abs() < 1e-6);
        assert!((before.y - after.y).abs() < 1e-6);
    }

    #[test]
    fn unknown_crs_is_rejected() {
        let geoms = Geometries::new(vec![], Some(3857));
        assert!(geoms.to_reference().is_err());
    }
}
