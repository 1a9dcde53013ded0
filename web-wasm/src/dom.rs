//! DOM 描画アダプタ
//!
//! コントロールの宣言的な記述（ControlSpec）を実際の要素に変換し、
//! ControlSurface として同期エンジンから読み書きできるようにする。

use comment_tagger_common::{ControlId, ControlSpec, ControlSurface, ControlValue};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlInputElement, HtmlSelectElement};

/// タグ付け対象の要素に付けるクラス名
pub const MARKER_CLASS: &str = "ui";

/// クラスを持つ要素を列挙
///
/// getElementsByClassName は生きたコレクションなので、先に配列へ写してから使う。
pub fn marked_elements(document: &Document, class_name: &str) -> Vec<Element> {
    let collection = document.get_elements_by_class_name(class_name);
    (0..collection.length())
        .filter_map(|i| collection.item(i))
        .collect()
}

/// コントロールを描画してホスト要素の子に追加
///
/// 作成した select / checkbox 要素を返す。
pub fn render_controls(
    document: &Document,
    host: &Element,
    specs: &[ControlSpec],
) -> Result<Vec<Element>, JsValue> {
    let mut controls = Vec::new();

    for spec in specs {
        match spec {
            ControlSpec::Select { id, options } => {
                let select = document.create_element("select")?;
                select.set_id(&id.encode());
                for option in options {
                    let element = document.create_element("option")?;
                    element.set_attribute("value", &option.value)?;
                    element.set_text_content(Some(&option.text));
                    select.append_child(&element)?;
                }
                host.append_child(&select)?;
                controls.push(select);
            }
            ControlSpec::Checkbox { id, caption } => {
                let label = document.create_element("label")?;
                let checkbox = document.create_element("input")?;
                checkbox.set_id(&id.encode());
                checkbox.set_attribute("type", "checkbox")?;
                label.append_child(&checkbox)?;
                label.append_child(&document.create_text_node(caption))?;
                host.append_child(&label)?;
                controls.push(checkbox);
            }
            ControlSpec::Spacer => {
                host.append_child(&document.create_text_node(" "))?;
            }
        }
    }

    Ok(controls)
}

/// 要素からコントロールの状態を読む
pub fn read_element(element: &Element) -> Option<ControlValue> {
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some(ControlValue::Selected(select.value()));
    }
    element
        .dyn_ref::<HtmlInputElement>()
        .map(|input| ControlValue::Checked(input.checked()))
}

fn write_element(element: &Element, value: &ControlValue) {
    match value {
        ControlValue::Selected(code) => {
            if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
                select.set_value(code);
            }
        }
        ControlValue::Checked(checked) => {
            if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                input.set_checked(*checked);
            }
        }
    }
}

/// id で要素を引くコントロール群
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl ControlSurface for DomSurface {
    fn read(&self, id: &ControlId) -> Option<ControlValue> {
        let element = self.document.get_element_by_id(&id.encode())?;
        read_element(&element)
    }

    fn write(&mut self, id: &ControlId, value: &ControlValue) {
        // ページから消えたコントロールは無視
        if let Some(element) = self.document.get_element_by_id(&id.encode()) {
            write_element(&element, value);
        }
    }
}
