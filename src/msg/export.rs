//-
// Copyright (c) 2026, the Msgtrawl authors
//
// This file is part of Msgtrawl.
//
// Msgtrawl is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Msgtrawl is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Msgtrawl. If not, see <http://www.gnu.org/licenses/>.

//! Turning an embedded message back into a stand-alone `.msg` file.

use log::debug;

use super::props::StreamHeader;
use super::tags;
use crate::cfb::writer::{Burner, Node};
use crate::cfb::{Container, Folder};
use crate::support::error::Error;

/// Export the embedded message storage at `storage` as a complete compound
/// file.
///
/// The storage's tree is copied as-is except that its property stream gets
/// the longer top-level header, and the named property mapping of the
/// enclosing file is copied in so that named properties still resolve.
pub fn export_embedded(
    container: &Container<'_>,
    storage: usize,
) -> Result<Vec<u8>, Error> {
    let folder = match container.folder(storage) {
        Some(folder) if 0 != storage => folder,
        _ => return Err(Error::NoSuchAttachment),
    };

    let mut nodes = copy_tree(folder);
    let has_nameid = folder.sub_folder(tags::NAMEID_STORAGE).is_some();
    if !has_nameid {
        if let Some(nameid) =
            container.root_folder().sub_folder(tags::NAMEID_STORAGE)
        {
            nodes.push(Node::storage(tags::NAMEID_STORAGE, copy_tree(nameid)));
        }
    }

    for node in &mut nodes {
        if tags::PROPERTIES_STREAM == node.name {
            let properties = folder
                .read_file(tags::PROPERTIES_STREAM)
                .unwrap_or_default();
            *node = Node::bytes(
                tags::PROPERTIES_STREAM,
                widen_property_header(&properties),
            );
        }
    }

    debug!(
        "Exporting embedded message {} with {} top-level nodes",
        folder.name(),
        nodes.len()
    );
    Burner::new().burn(&nodes)
}

fn copy_tree<'c>(folder: Folder<'c, '_>) -> Vec<Node<'c>> {
    let mut nodes: Vec<Node<'c>> = folder
        .file_name_and_length_pairs()
        .into_iter()
        .map(|stream| Node::stream(stream.name(), move || stream.read()))
        .collect();
    nodes.extend(
        folder
            .sub_folders()
            .into_iter()
            .map(|sub| Node::storage(sub.name(), copy_tree(sub))),
    );
    nodes
}

/// Insert the 8 extra reserved bytes that distinguish a top-level property
/// stream header from an embedded one.
fn widen_property_header(properties: &[u8]) -> Vec<u8> {
    let split = StreamHeader::Embedded.size().min(properties.len());
    let mut widened = Vec::with_capacity(properties.len() + 8);
    widened.extend_from_slice(&properties[..split]);
    widened.resize(StreamHeader::Embedded.size(), 0);
    widened.extend_from_slice(&[0; 8]);
    widened.extend_from_slice(&properties[split..]);
    widened
}
