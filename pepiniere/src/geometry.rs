//! Codec géométrique des limites de parcelles
//!
//! Le stockage est en ordre géographique (longitude, latitude); la couche
//! carte consomme l'ordre (latitude, longitude). La conversion vit ici,
//! sous forme de fonctions testées, plutôt que d'échanges d'axes dispersés
//! aux points d'appel.

use geo::{Coord, LineString, Polygon};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Centre de la vue carte par défaut (centre de la France), en ordre de
/// stockage: x = longitude, y = latitude
pub const DEFAULT_CENTER: Coord = Coord {
    x: 1.888334,
    y: 46.603354,
};

/// Demi-côté du carré de remplacement, en degrés (~100 m)
const PLACEHOLDER_HALF_SIDE: f64 = 0.001;

/// Échange les axes d'un anneau stocké (lon, lat) vers l'ordre d'affichage
/// (lat, lon). Pure et totale: nombre et ordre des sommets préservés.
pub fn to_display_order(ring: &[Coord]) -> Vec<Coord> {
    ring.iter().map(|c| Coord { x: c.y, y: c.x }).collect()
}

/// Inverse exact de [`to_display_order`]: l'échange d'axes est involutif,
/// composer les deux dans un sens ou l'autre est l'identité.
pub fn to_storage_order(ring: &[Coord]) -> Vec<Coord> {
    ring.iter().map(|c| Coord { x: c.y, y: c.x }).collect()
}

/// Centre d'un anneau: moyenne arithmétique des sommets, sans pondération
/// par l'aire. Suffisant pour le cadrage initial de la carte.
///
/// Un anneau vide retourne [`DEFAULT_CENTER`].
pub fn ring_center(ring: &[Coord]) -> Coord {
    if ring.is_empty() {
        return DEFAULT_CENTER;
    }
    let n = ring.len() as f64;
    let (sx, sy) = ring
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
    Coord {
        x: sx / n,
        y: sy / n,
    }
}

/// Anneau de remplacement pour une limite absente: petit carré fixe autour
/// du centre par défaut, pour que le rendu ne reçoive jamais d'anneau vide.
pub fn placeholder_ring() -> Vec<Coord> {
    let Coord { x, y } = DEFAULT_CENTER;
    let d = PLACEHOLDER_HALF_SIDE;
    vec![
        Coord { x: x - d, y: y - d },
        Coord { x: x + d, y: y - d },
        Coord { x: x + d, y: y + d },
        Coord { x: x - d, y: y + d },
    ]
}

/// Limite géographique d'une parcelle.
///
/// Seul l'anneau extérieur est modélisé, en ordre de stockage (lon, lat);
/// les trous ne le sont pas. L'anneau est gardé ouvert en mémoire (le
/// premier sommet ferme implicitement le dernier); la forme persistée
/// GeoJSON est fermée explicitement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Boundary {
    exterior: Vec<Coord>,
}

impl Boundary {
    /// Construit une limite depuis un anneau extérieur; un sommet de
    /// fermeture explicite (dernier == premier) est retiré
    pub fn new(mut exterior: Vec<Coord>) -> Self {
        if exterior.len() > 1 && exterior.first() == exterior.last() {
            exterior.pop();
        }
        Self { exterior }
    }

    /// Limite absente
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }

    /// Anneau extérieur tel que stocké (ouvert)
    pub fn exterior(&self) -> &[Coord] {
        &self.exterior
    }

    /// Anneau extérieur garanti non vide: carré de remplacement si absent
    pub fn exterior_or_placeholder(&self) -> Vec<Coord> {
        if self.exterior.is_empty() {
            placeholder_ring()
        } else {
            self.exterior.clone()
        }
    }

    /// Limite persistable: elle-même, ou le carré de remplacement si vide
    pub fn or_placeholder(&self) -> Boundary {
        if self.is_empty() {
            Boundary {
                exterior: placeholder_ring(),
            }
        } else {
            self.clone()
        }
    }

    /// Centre de la limite (moyenne des sommets), en ordre de stockage
    pub fn center(&self) -> Coord {
        ring_center(&self.exterior)
    }

    /// Centre de la vue carte: centre converti en ordre d'affichage
    /// (lat, lon)
    pub fn view_center(&self) -> Coord {
        let c = self.center();
        Coord { x: c.y, y: c.x }
    }

    /// Polygone `geo` pour l'interopérabilité avec l'écosystème géospatial
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(LineString::new(self.exterior_or_placeholder()), vec![])
    }
}

impl Serialize for Boundary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Forme persistée: {"type":"Polygon","coordinates":[[[lon,lat],…]]}
        // avec anneau fermé explicitement comme l'exige GeoJSON.
        let mut ring: Vec<Vec<f64>> = self.exterior.iter().map(|c| vec![c.x, c.y]).collect();
        if let Some(first) = ring.first().cloned() {
            if ring.last() != Some(&first) {
                ring.push(first);
            }
        }
        geojson::Geometry::new(geojson::Value::Polygon(vec![ring])).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Boundary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Tolérant: null, anneau vide ou géométrie d'un autre type donnent
        // une limite absente, jamais une erreur.
        let geometry = Option::<geojson::Geometry>::deserialize(deserializer)?;
        let exterior = match geometry.map(|g| g.value) {
            Some(geojson::Value::Polygon(rings)) => rings
                .into_iter()
                .next()
                .unwrap_or_default()
                .into_iter()
                .filter(|pos| pos.len() >= 2)
                .map(|pos| Coord {
                    x: pos[0],
                    y: pos[1],
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(Boundary::new(exterior))
    }
}
